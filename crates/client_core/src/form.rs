//! Draft state for the create-entry form.

use std::{
    fmt,
    str::FromStr,
    sync::{PoisonError, RwLock},
};

use shared::{
    domain::{GrowthStage, ParseGrowthStageError, UserId},
    protocol::CreateEntryRequest,
};
use thiserror::Error;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftField {
    Title,
    Content,
    GrowthStage,
    UserId,
}

impl DraftField {
    pub fn name(self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Content => "content",
            DraftField::GrowthStage => "growthStage",
            DraftField::UserId => "userId",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DraftField::Title => "Title",
            DraftField::Content => "Content",
            DraftField::GrowthStage => "Growth stage",
            DraftField::UserId => "User ID",
        }
    }
}

impl fmt::Display for DraftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DraftField {
    type Err = FieldError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "title" => Ok(DraftField::Title),
            "content" => Ok(DraftField::Content),
            "growthStage" | "growth_stage" => Ok(DraftField::GrowthStage),
            "userId" | "user_id" => Ok(DraftField::UserId),
            other => Err(FieldError::UnknownField(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("invalid value for {field}: {source}")]
    InvalidValue {
        field: DraftField,
        #[source]
        source: ParseGrowthStageError,
    },
}

/// Values exactly as entered. Trimming happens when a request is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub content: String,
    pub growth_stage: GrowthStage,
    pub user_id: String,
}

impl Draft {
    pub fn is_submittable(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::required(DraftField::Title));
        }
        if self.content.trim().is_empty() {
            return Err(ValidationError::required(DraftField::Content));
        }
        Ok(())
    }

    pub fn to_request(&self) -> Result<CreateEntryRequest, ValidationError> {
        self.validate()?;

        let user_id = self.user_id.trim();
        Ok(CreateEntryRequest {
            title: self.title.trim().to_string(),
            content: self.content.trim().to_string(),
            growth_stage: self.growth_stage,
            user_id: (!user_id.is_empty()).then(|| UserId::from(user_id)),
        })
    }
}

#[derive(Debug, Default)]
pub struct FieldStore {
    draft: RwLock<Draft>,
}

impl FieldStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_draft(draft: Draft) -> Self {
        Self {
            draft: RwLock::new(draft),
        }
    }

    pub fn draft(&self) -> Draft {
        self.draft
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_field(&self, name: &str, raw_value: &str) -> Result<(), FieldError> {
        self.set(name.parse()?, raw_value)
    }

    pub fn set(&self, field: DraftField, raw_value: &str) -> Result<(), FieldError> {
        // Parse before taking the lock so a rejected value leaves the draft as it was.
        let growth_stage = match field {
            DraftField::GrowthStage => Some(
                raw_value
                    .parse::<GrowthStage>()
                    .map_err(|source| FieldError::InvalidValue { field, source })?,
            ),
            _ => None,
        };

        let mut draft = self.draft.write().unwrap_or_else(PoisonError::into_inner);
        match field {
            DraftField::Title => draft.title = raw_value.to_string(),
            DraftField::Content => draft.content = raw_value.to_string(),
            DraftField::UserId => draft.user_id = raw_value.to_string(),
            DraftField::GrowthStage => {
                if let Some(stage) = growth_stage {
                    draft.growth_stage = stage;
                }
            }
        }
        Ok(())
    }

    pub fn reset(&self) {
        *self.draft.write().unwrap_or_else(PoisonError::into_inner) = Draft::default();
    }
}

use crate::utils::error::AppError;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Identity,
    Accounting,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DocKind {
    Passport,
    DriverLicense,
    BankStatement,
    Compliance,
    Expenses,
    Other,
}

/// Categorias mostradas no portal do cliente
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiCategory {
    Identity,
    Bank,
    Compliance,
    Expenses,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentitySubCategory {
    Passport,
    License,
}

impl DocumentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentCategory::Identity => "identity",
            DocumentCategory::Accounting => "accounting",
            DocumentCategory::Other => "other",
        }
    }
}

impl DocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocKind::Passport => "passport",
            DocKind::DriverLicense => "driver_license",
            DocKind::BankStatement => "bank_statement",
            DocKind::Compliance => "compliance",
            DocKind::Expenses => "expenses",
            DocKind::Other => "other",
        }
    }

    /// Identity kinds hold a single active document per client.
    pub fn is_single_slot(&self) -> bool {
        matches!(self, DocKind::Passport | DocKind::DriverLicense)
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for DocKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_label(raw: &str) -> String {
    raw.trim().to_uppercase().replace(['-', ' '], "_")
}

impl UiCategory {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match normalize_label(raw).as_str() {
            "IDENTITY" | "ID" => Ok(UiCategory::Identity),
            "BANK" | "BANK_STATEMENT" | "BANK_STATEMENTS" => Ok(UiCategory::Bank),
            "COMPLIANCE" => Ok(UiCategory::Compliance),
            "EXPENSES" => Ok(UiCategory::Expenses),
            "OTHER" => Ok(UiCategory::Other),
            _ => Err(AppError::InvalidRequest(format!("Unknown document category: {}", raw))),
        }
    }
}

impl IdentitySubCategory {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        match normalize_label(raw).as_str() {
            "PASSPORT" => Ok(IdentitySubCategory::Passport),
            "LICENSE" | "LICENCE" | "DRIVER_LICENSE" | "DRIVERS_LICENSE" | "DRIVING_LICENCE" => {
                Ok(IdentitySubCategory::License)
            }
            _ => Err(AppError::InvalidRequest(format!("Unknown identity document type: {}", raw))),
        }
    }
}

/// Maps the portal taxonomy onto `(category, doc_kind)`.
///
/// IDENTITY needs a sub-category; other categories ignore it.
pub fn classify_upload(
    ui_category: &str,
    sub_category: Option<&str>,
) -> Result<(DocumentCategory, DocKind), AppError> {
    let ui = UiCategory::parse(ui_category)?;
    let mapped = match ui {
        UiCategory::Identity => {
            let sub = sub_category
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| {
                    AppError::InvalidRequest(
                        "Identity documents need a sub_category (PASSPORT or LICENSE)".to_string(),
                    )
                })?;
            match IdentitySubCategory::parse(sub)? {
                IdentitySubCategory::Passport => (DocumentCategory::Identity, DocKind::Passport),
                IdentitySubCategory::License => (DocumentCategory::Identity, DocKind::DriverLicense),
            }
        }
        UiCategory::Bank => (DocumentCategory::Accounting, DocKind::BankStatement),
        UiCategory::Compliance => (DocumentCategory::Accounting, DocKind::Compliance),
        UiCategory::Expenses => (DocumentCategory::Accounting, DocKind::Expenses),
        UiCategory::Other => (DocumentCategory::Other, DocKind::Other),
    };
    Ok(mapped)
}

/// Documento do cliente (collection "documents")
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Document {
    #[serde(rename = "_id")]
    pub id: String,
    pub client_id: String,
    /// Nome original do arquivo
    pub name: String,
    pub category: DocumentCategory,
    pub doc_kind: DocKind,
    /// Caminho relativo à raiz de uploads
    pub file_path: String,
    pub mime_type: String,
    pub file_size: u64,
    pub uploaded_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden_at: Option<i64>,
}

impl Document {
    pub fn is_hidden(&self) -> bool {
        self.hidden_at.is_some()
    }

    /// Reverse of `classify_upload`, used to group listings.
    pub fn ui_category(&self) -> UiCategory {
        match self.doc_kind {
            DocKind::Passport | DocKind::DriverLicense => UiCategory::Identity,
            DocKind::BankStatement => UiCategory::Bank,
            DocKind::Compliance => UiCategory::Compliance,
            DocKind::Expenses => UiCategory::Expenses,
            DocKind::Other => match self.category {
                DocumentCategory::Identity => UiCategory::Identity,
                _ => UiCategory::Other,
            },
        }
    }

    pub fn ui_sub_category(&self) -> Option<IdentitySubCategory> {
        match self.doc_kind {
            DocKind::Passport => Some(IdentitySubCategory::Passport),
            DocKind::DriverLicense => Some(IdentitySubCategory::License),
            _ => None,
        }
    }
}

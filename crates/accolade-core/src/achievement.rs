//! Achievement content: the unstructured payload kept in the document store.
//!
//! Content carries no workflow state. Its status lives on the matching
//! [`AchievementReference`](crate::reference::AchievementReference) row.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Opaque identifier assigned by the content store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ContentId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Category ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Academic,
  Competition,
  Organization,
  Publication,
  Certification,
  Other,
}

impl Category {
  pub const ALL: [Category; 6] = [
    Self::Academic,
    Self::Competition,
    Self::Organization,
    Self::Publication,
    Self::Certification,
    Self::Other,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Academic => "academic",
      Self::Competition => "competition",
      Self::Organization => "organization",
      Self::Publication => "publication",
      Self::Certification => "certification",
      Self::Other => "other",
    }
  }
}

impl FromStr for Category {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    let wanted = s.trim().to_lowercase();
    Self::ALL
      .into_iter()
      .find(|c| c.as_str() == wanted)
      .ok_or_else(|| Error::validation(format!("unknown achievement category: {s:?}")))
  }
}

// ─── Per-category details ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AcademicDetails {
  pub score:       Option<f64>,
  pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompetitionDetails {
  pub competition_name:  Option<String>,
  /// Lowercased on the way in, e.g. `"national"`.
  pub competition_level: Option<String>,
  pub rank:              Option<i64>,
  pub organizer:         Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OrganizationDetails {
  pub organization_name: Option<String>,
  pub position:          Option<String>,
  pub period_start:      Option<NaiveDate>,
  pub period_end:        Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PublicationDetails {
  pub publication_type:  Option<String>,
  pub publication_title: Option<String>,
  #[serde(default)]
  pub authors:           Vec<String>,
  pub publisher:         Option<String>,
  pub issn:              Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CertificationDetails {
  pub certification_name:   Option<String>,
  pub issued_by:            Option<String>,
  pub certification_number: Option<String>,
  pub valid_until:          Option<NaiveDate>,
}

/// The typed detail bag of an achievement. The variant doubles as the
/// achievement's [`Category`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "lowercase")]
pub enum AchievementDetails {
  Academic(AcademicDetails),
  Competition(CompetitionDetails),
  Organization(OrganizationDetails),
  Publication(PublicationDetails),
  Certification(CertificationDetails),
  /// Free-form fields for achievements outside the fixed taxonomy.
  Other(Map<String, Value>),
}

impl AchievementDetails {
  pub fn category(&self) -> Category {
    match self {
      Self::Academic(_) => Category::Academic,
      Self::Competition(_) => Category::Competition,
      Self::Organization(_) => Category::Organization,
      Self::Publication(_) => Category::Publication,
      Self::Certification(_) => Category::Certification,
      Self::Other(_) => Category::Other,
    }
  }

  /// Validate and normalise a raw JSON detail object for `category`.
  ///
  /// `null` yields an empty variant. A competition `rank` given as a JSON
  /// float is truncated to an integer, and `competitionLevel` is trimmed and
  /// lowercased.
  pub fn from_raw(category: Category, raw: Value) -> Result<Self> {
    let mut fields = match raw {
      Value::Null => Map::new(),
      Value::Object(map) => map,
      _ => return Err(Error::validation("details must be a JSON object")),
    };

    if category == Category::Competition {
      normalize_competition(&mut fields)?;
    }

    let value = Value::Object(fields);
    let invalid =
      |e: serde_json::Error| Error::validation(format!("invalid {} details: {e}", category.as_str()));

    Ok(match category {
      Category::Academic => Self::Academic(serde_json::from_value(value).map_err(invalid)?),
      Category::Competition => Self::Competition(serde_json::from_value(value).map_err(invalid)?),
      Category::Organization => {
        Self::Organization(serde_json::from_value(value).map_err(invalid)?)
      }
      Category::Publication => Self::Publication(serde_json::from_value(value).map_err(invalid)?),
      Category::Certification => {
        Self::Certification(serde_json::from_value(value).map_err(invalid)?)
      }
      Category::Other => match value {
        Value::Object(map) => Self::Other(map),
        _ => Self::Other(Map::new()),
      },
    })
  }
}

fn normalize_competition(fields: &mut Map<String, Value>) -> Result<()> {
  if let Some(rank) = fields.get_mut("rank") {
    let coerced = match &*rank {
      Value::Null => None,
      Value::Number(n) if n.is_i64() => None,
      Value::Number(n) => match n.as_f64() {
        Some(f) if f.is_finite() => Some(Value::from(f.trunc() as i64)),
        _ => return Err(Error::validation("rank must be an integer")),
      },
      _ => return Err(Error::validation("rank must be numeric")),
    };
    if let Some(v) = coerced {
      *rank = v;
    }
  }
  if let Some(Value::String(level)) = fields.get_mut("competitionLevel") {
    *level = level.trim().to_lowercase();
  }
  Ok(())
}

// ─── Attachments ─────────────────────────────────────────────────────────────

/// Metadata for a file already uploaded elsewhere; no bytes live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
  pub file_name:   String,
  pub file_url:    String,
  /// Media type, e.g. `application/pdf`.
  pub file_type:   String,
  #[serde(default = "Utc::now")]
  pub uploaded_at: DateTime<Utc>,
}

// ─── Achievement ─────────────────────────────────────────────────────────────

/// A content record as held by the document store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
  pub content_id:  ContentId,
  pub student_id:  Uuid,
  pub title:       String,
  pub description: String,
  pub details:     AchievementDetails,
  pub attachments: Vec<Attachment>,
  pub tags:        Vec<String>,
  pub points:      Option<i64>,
  /// Store-assigned.
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

impl Achievement {
  pub fn category(&self) -> Category { self.details.category() }
}

/// Validated content handed to [`ContentStore::create`](crate::store::ContentStore::create).
/// Identifier and timestamps are always assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAchievement {
  pub title:       String,
  pub description: String,
  pub details:     AchievementDetails,
  pub attachments: Vec<Attachment>,
  pub tags:        Vec<String>,
  pub points:      Option<i64>,
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Raw creation input as it arrives from the outer request layer.
///
/// Missing strings default to empty so that they are reported as validation
/// failures rather than as decoding errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AchievementRequest {
  #[serde(default, alias = "achievement_type")]
  pub category:    String,
  #[serde(default)]
  pub title:       String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub details:     Value,
  #[serde(default)]
  pub tags:        Vec<String>,
  pub points:      Option<i64>,
  #[serde(default)]
  pub attachments: Vec<Attachment>,
}

impl AchievementRequest {
  /// Check required fields and normalise the detail bag for its category.
  pub fn normalize(self) -> Result<NewAchievement> {
    let title = self.title.trim();
    let description = self.description.trim();
    if self.category.trim().is_empty() || title.is_empty() || description.is_empty() {
      return Err(Error::validation(
        "category, title, and description are required",
      ));
    }

    let category: Category = self.category.parse()?;
    let details = AchievementDetails::from_raw(category, self.details)?;

    let tags = self
      .tags
      .iter()
      .map(|t| t.trim())
      .filter(|t| !t.is_empty())
      .map(str::to_owned)
      .collect();

    Ok(NewAchievement {
      title: title.to_owned(),
      description: description.to_owned(),
      details,
      attachments: self.attachments,
      tags,
      points: self.points,
    })
  }
}

// src/models.rs
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    #[serde(alias = "Low")]
    Minor,
    #[serde(alias = "Medium")]
    Moderate,
    #[serde(alias = "High")]
    Severe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Minor => "Minor",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageKind {
    Scratch,
    Dent,
    Crack,
    Rust,
    #[serde(rename = "Paint Damage")]
    PaintDamage,
    #[serde(rename = "Broken Glass")]
    BrokenGlass,
}

impl fmt::Display for DamageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DamageKind::Scratch => "Scratch",
            DamageKind::Dent => "Dent",
            DamageKind::Crack => "Crack",
            DamageKind::Rust => "Rust",
            DamageKind::PaintDamage => "Paint Damage",
            DamageKind::BrokenGlass => "Broken Glass",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisStatus {
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageFinding {
    #[serde(rename = "type")]
    pub kind: DamageKind,
    pub location: String,
    pub severity: Severity,
    pub coordinates: BoundingBox,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CostCategory {
    Labor,
    Parts,
    Paint,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdownItem {
    pub item: String,
    pub cost: f64,
    #[serde(default)]
    pub category: CostCategory,
    #[serde(default)]
    pub description: String,
}

/// Aggregate repair cost. The backends disagree on key casing, so both
/// spellings are accepted on input; output is always camelCase.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CostEstimation {
    #[serde(alias = "total_cost")]
    pub total_cost: f64,
    #[serde(alias = "labor_cost")]
    pub labor_cost: f64,
    #[serde(alias = "parts_cost")]
    pub parts_cost: f64,
    #[serde(alias = "paint_cost")]
    pub paint_cost: f64,
    pub breakdown: Vec<CostBreakdownItem>,
}

impl CostEstimation {
    pub fn is_zero(&self) -> bool {
        self.total_cost == 0.0
            && self.labor_cost == 0.0
            && self.parts_cost == 0.0
            && self.paint_cost == 0.0
            && self.breakdown.is_empty()
    }

    fn check_non_negative(&self) -> Result<(), String> {
        let fields = [
            ("totalCost", self.total_cost),
            ("laborCost", self.labor_cost),
            ("partsCost", self.parts_cost),
            ("paintCost", self.paint_cost),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{} must be a non-negative amount, got {}", name, value));
            }
        }
        for entry in &self.breakdown {
            if !entry.cost.is_finite() || entry.cost < 0.0 {
                return Err(format!(
                    "breakdown item '{}' has invalid cost {}",
                    entry.item, entry.cost
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageAnalysis {
    pub id: String,
    pub user_id: String,
    pub image_uri: String,
    pub analysis_date: DateTime<Utc>,
    pub damage_detected: bool,
    pub damage_type: Vec<DamageFinding>,
    pub severity: Severity,
    pub cost_estimation: CostEstimation,
    pub status: AnalysisStatus,
    pub confidence: f64,
}

/// Analysis object exactly as the service sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub user_id: String,
    #[serde(alias = "image_uri")]
    pub image_path: String,
    pub analysis_date: String,
    pub damage_detected: bool,
    pub confidence: f64,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub analysis_data: Option<AnalysisData>,
    // Older service builds put these next to the record instead of under analysis_data.
    #[serde(default)]
    pub damage_types: Option<Vec<DamageFinding>>,
    #[serde(default)]
    pub cost_estimation: Option<CostEstimation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalysisData {
    #[serde(default)]
    pub damage_types: Option<Vec<DamageFinding>>,
    #[serde(default)]
    pub cost_estimation: Option<CostEstimation>,
}

impl TryFrom<AnalysisRecord> for DamageAnalysis {
    type Error = String;

    fn try_from(record: AnalysisRecord) -> Result<Self, Self::Error> {
        if !(0.0..=1.0).contains(&record.confidence) {
            return Err(format!(
                "confidence {} is outside [0, 1]",
                record.confidence
            ));
        }

        let analysis_date = parse_timestamp(&record.analysis_date)?;

        let data = record.analysis_data.unwrap_or_default();
        let findings = data
            .damage_types
            .or(record.damage_types)
            .unwrap_or_default();
        let estimation = data
            .cost_estimation
            .or(record.cost_estimation)
            .unwrap_or_default();
        estimation.check_non_negative()?;

        let (damage_type, cost_estimation) = if record.damage_detected {
            (findings, estimation)
        } else {
            (Vec::new(), CostEstimation::default())
        };

        let severity = record.severity.unwrap_or_else(|| {
            damage_type
                .iter()
                .map(|finding| finding.severity)
                .max()
                .unwrap_or(Severity::Minor)
        });

        Ok(DamageAnalysis {
            id: record.id,
            user_id: record.user_id,
            image_uri: record.image_path,
            analysis_date,
            damage_detected: record.damage_detected,
            damage_type,
            severity,
            cost_estimation,
            status: AnalysisStatus::Completed,
            confidence: record.confidence,
        })
    }
}

/// RFC 3339 first, then the offset-less ISO form some servers emit (read as UTC).
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| format!("invalid analysis_date '{}': {}", raw, e))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

use serde::{Deserialize, Serialize};

use crate::errors::PricingError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorkId(pub String);

impl std::fmt::Display for WorkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl std::fmt::Display for ClientId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Clinical family of a work. Only fixed prosthetics have a pricing
/// mapping today; other families must fail fast instead of silently
/// defaulting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkFamily {
    FixedProsthesis,
    RemovableProsthesis,
    Orthodontic,
}

impl WorkFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FixedProsthesis => "fixed_prosthesis",
            Self::RemovableProsthesis => "removable_prosthesis",
            Self::Orthodontic => "orthodontic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "fixed_prosthesis" => Some(Self::FixedProsthesis),
            "removable_prosthesis" => Some(Self::RemovableProsthesis),
            "orthodontic" => Some(Self::Orthodontic),
            _ => None,
        }
    }
}

/// Pricing type a work resolves rules against. Bridges are priced with the
/// crown-equivalent type, so the only value today is `Crown`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkType {
    Crown,
}

impl WorkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Crown => "crown",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "crown" => Some(Self::Crown),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrownWork {
    pub work_id: WorkId,
    pub work_type: WorkType,
    pub constitution: Option<String>,
    pub building_technique: Option<String>,
    pub core_material_id: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BridgeToothRole {
    Abutment,
    Pontic,
}

impl BridgeToothRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Abutment => "abutment",
            Self::Pontic => "pontic",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "abutment" => Some(Self::Abutment),
            "pontic" => Some(Self::Pontic),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeTooth {
    pub tooth_number: u8,
    pub role: BridgeToothRole,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeWork {
    pub work_id: WorkId,
    pub constitution: Option<String>,
    pub building_technique: Option<String>,
    pub core_material_id: Option<String>,
    pub teeth: Vec<BridgeTooth>,
}

/// Subtype union for fixed-prosthesis works. Each variant supplies a pure
/// mapping into the family-agnostic pricing identity; adding a new variant
/// never touches the rule matcher.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkRecord {
    Crown(CrownWork),
    Bridge(BridgeWork),
}

/// Flattened, family-agnostic attribute set used to look up a pricing rule.
/// Computed fresh per resolution and never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPricingIdentity {
    pub work_id: WorkId,
    pub work_family: WorkFamily,
    pub work_type: WorkType,
    pub constitution: Option<String>,
    pub building_technique: Option<String>,
    pub core_material_id: Option<String>,
    pub prosthetic_units: u32,
}

impl WorkRecord {
    pub fn work_id(&self) -> &WorkId {
        match self {
            Self::Crown(crown) => &crown.work_id,
            Self::Bridge(bridge) => &bridge.work_id,
        }
    }

    /// Flatten into the pricing identity. A crown is a single prosthetic
    /// unit; a bridge contributes one unit per constituent tooth and is
    /// priced with the crown-equivalent type. Tooth roles stay out of the
    /// identity; they belong to a future pricing-policy layer.
    pub fn pricing_identity(&self) -> WorkPricingIdentity {
        match self {
            Self::Crown(crown) => WorkPricingIdentity {
                work_id: crown.work_id.clone(),
                work_family: WorkFamily::FixedProsthesis,
                work_type: crown.work_type,
                constitution: crown.constitution.clone(),
                building_technique: crown.building_technique.clone(),
                core_material_id: crown.core_material_id.clone(),
                prosthetic_units: 1,
            },
            Self::Bridge(bridge) => WorkPricingIdentity {
                work_id: bridge.work_id.clone(),
                work_family: WorkFamily::FixedProsthesis,
                work_type: WorkType::Crown,
                constitution: bridge.constitution.clone(),
                building_technique: bridge.building_technique.clone(),
                core_material_id: bridge.core_material_id.clone(),
                prosthetic_units: bridge.teeth.len() as u32,
            },
        }
    }
}

/// Dispatch a loaded record by family. Families without a pricing mapping
/// fail fast rather than defaulting to anything. A bridge without teeth has
/// zero prosthetic units and would price per-unit rules at 0.00, so it is
/// rejected as malformed data instead.
pub fn resolve_identity(
    family: WorkFamily,
    record: &WorkRecord,
) -> Result<WorkPricingIdentity, PricingError> {
    match family {
        WorkFamily::FixedProsthesis => {
            if let WorkRecord::Bridge(bridge) = record {
                if bridge.teeth.is_empty() {
                    return Err(PricingError::EmptyBridge { work_id: bridge.work_id.clone() });
                }
            }
            Ok(record.pricing_identity())
        }
        other => Err(PricingError::UnsupportedFamily { family: other }),
    }
}

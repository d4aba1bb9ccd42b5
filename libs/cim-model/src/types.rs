//! Core domain types for the network model
//!
//! Phase codes, measurement types and measurement kinds shared by the graph
//! model, the document codec and the synthesis engine.

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Phase codes
// ============================================================================

/// Phase combination attached to a measurement or a transformer end
///
/// Serialized with the exact CIM tokens (`ABCN`, `s12N`, `none`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PhaseCode {
    #[serde(rename = "ABCN")]
    Abcn,
    #[serde(rename = "ABC")]
    Abc,
    #[serde(rename = "ABN")]
    Abn,
    #[serde(rename = "ACN")]
    Acn,
    #[serde(rename = "BCN")]
    Bcn,
    #[serde(rename = "AB")]
    Ab,
    #[serde(rename = "AC")]
    Ac,
    #[serde(rename = "BC")]
    Bc,
    #[serde(rename = "AN")]
    An,
    #[serde(rename = "BN")]
    Bn,
    #[serde(rename = "CN")]
    Cn,
    A,
    B,
    C,
    N,
    #[serde(rename = "s1N")]
    S1n,
    #[serde(rename = "s2N")]
    S2n,
    #[serde(rename = "s12N")]
    S12n,
    #[serde(rename = "s1")]
    S1,
    #[serde(rename = "s2")]
    S2,
    #[serde(rename = "s12")]
    S12,
    #[serde(rename = "none")]
    None,
}

impl PhaseCode {
    /// Every phase code, in declaration order
    pub const ALL: [PhaseCode; 22] = [
        PhaseCode::Abcn,
        PhaseCode::Abc,
        PhaseCode::Abn,
        PhaseCode::Acn,
        PhaseCode::Bcn,
        PhaseCode::Ab,
        PhaseCode::Ac,
        PhaseCode::Bc,
        PhaseCode::An,
        PhaseCode::Bn,
        PhaseCode::Cn,
        PhaseCode::A,
        PhaseCode::B,
        PhaseCode::C,
        PhaseCode::N,
        PhaseCode::S1n,
        PhaseCode::S2n,
        PhaseCode::S12n,
        PhaseCode::S1,
        PhaseCode::S2,
        PhaseCode::S12,
        PhaseCode::None,
    ];

    /// CIM token for this phase code
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseCode::Abcn => "ABCN",
            PhaseCode::Abc => "ABC",
            PhaseCode::Abn => "ABN",
            PhaseCode::Acn => "ACN",
            PhaseCode::Bcn => "BCN",
            PhaseCode::Ab => "AB",
            PhaseCode::Ac => "AC",
            PhaseCode::Bc => "BC",
            PhaseCode::An => "AN",
            PhaseCode::Bn => "BN",
            PhaseCode::Cn => "CN",
            PhaseCode::A => "A",
            PhaseCode::B => "B",
            PhaseCode::C => "C",
            PhaseCode::N => "N",
            PhaseCode::S1n => "s1N",
            PhaseCode::S2n => "s2N",
            PhaseCode::S12n => "s12N",
            PhaseCode::S1 => "s1",
            PhaseCode::S2 => "s2",
            PhaseCode::S12 => "s12",
            PhaseCode::None => "none",
        }
    }

    /// Split-phase secondary codes (triplex service side)
    pub fn is_split_secondary(&self) -> bool {
        matches!(
            self,
            PhaseCode::S1
                | PhaseCode::S12
                | PhaseCode::S12n
                | PhaseCode::S1n
                | PhaseCode::S2
                | PhaseCode::S2n
        )
    }
}

impl fmt::Display for PhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PhaseCode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PhaseCode::ALL
            .iter()
            .copied()
            .find(|code| code.as_str() == s)
            .ok_or_else(|| {
                ModelError::invalid_argument("phase code", format!("'{}' is not a PhaseCode", s))
            })
    }
}

/// Single conductor phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SinglePhaseKind {
    A,
    B,
    C,
    N,
    #[serde(rename = "s1")]
    S1,
    #[serde(rename = "s2")]
    S2,
}

impl SinglePhaseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SinglePhaseKind::A => "A",
            SinglePhaseKind::B => "B",
            SinglePhaseKind::C => "C",
            SinglePhaseKind::N => "N",
            SinglePhaseKind::S1 => "s1",
            SinglePhaseKind::S2 => "s2",
        }
    }

    /// Phase code carrying the same token
    pub fn to_phase_code(self) -> PhaseCode {
        match self {
            SinglePhaseKind::A => PhaseCode::A,
            SinglePhaseKind::B => PhaseCode::B,
            SinglePhaseKind::C => PhaseCode::C,
            SinglePhaseKind::N => PhaseCode::N,
            SinglePhaseKind::S1 => PhaseCode::S1,
            SinglePhaseKind::S2 => PhaseCode::S2,
        }
    }
}

impl fmt::Display for SinglePhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinglePhaseKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(SinglePhaseKind::A),
            "B" => Ok(SinglePhaseKind::B),
            "C" => Ok(SinglePhaseKind::C),
            "N" => Ok(SinglePhaseKind::N),
            "s1" => Ok(SinglePhaseKind::S1),
            "s2" => Ok(SinglePhaseKind::S2),
            _ => Err(ModelError::invalid_argument(
                "single phase kind",
                format!("'{}' is not one of A, B, C, N, s1, s2", s),
            )),
        }
    }
}

/// The three line phases used when equipment declares no phases
pub const DEFAULT_PHASES: [PhaseCode; 3] = [PhaseCode::A, PhaseCode::B, PhaseCode::C];

/// Ordered phase string of a transformer tank end (e.g. `AN`, `BA`, `s12N`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderedPhaseCode(String);

impl OrderedPhaseCode {
    pub fn parse(label: &str) -> Result<Self, ModelError> {
        let invalid = |reason: &str| {
            ModelError::invalid_argument(
                "ordered phase code",
                format!("'{}' {}", label, reason),
            )
        };

        if label.is_empty() {
            return Err(invalid("is empty"));
        }

        // Digits are only legal directly after an `s` or another digit
        let mut previous: Option<char> = None;
        for c in label.chars() {
            match c {
                'A' | 'B' | 'C' | 'N' | 's' => {
                    if previous == Some('s') {
                        return Err(invalid("has an `s` without a secondary number"));
                    }
                },
                '1' | '2' => {
                    if !matches!(previous, Some('s') | Some('1')) {
                        return Err(invalid("has a misplaced secondary number"));
                    }
                },
                _ => return Err(invalid("contains an unknown phase letter")),
            }
            previous = Some(c);
        }
        if previous == Some('s') {
            return Err(invalid("ends with an `s`"));
        }

        Ok(Self(label.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Label with the neutral removed (`AN` -> `A`, `s12N` -> `s12`)
    pub fn without_neutral(&self) -> String {
        self.0.replace('N', "")
    }

    /// Single-phase wye connection (`A`, `AN`, `B`, `BN`, `C`, `CN`)
    pub fn is_single_phase_wye(&self) -> bool {
        matches!(self.0.as_str(), "A" | "AN" | "B" | "BN" | "C" | "CN")
    }
}

impl fmt::Display for OrderedPhaseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for OrderedPhaseCode {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        OrderedPhaseCode::parse(&value)
    }
}

impl From<OrderedPhaseCode> for String {
    fn from(value: OrderedPhaseCode) -> Self {
        value.0
    }
}

// ============================================================================
// Measurement classification
// ============================================================================

/// Measured quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasurementType {
    /// Current magnitude
    #[serde(rename = "A")]
    Current,
    /// Phase-to-neutral voltage
    #[serde(rename = "PNV")]
    Voltage,
    /// Complex power
    #[serde(rename = "VA")]
    Power,
    /// Battery state of charge
    #[serde(rename = "SoC")]
    StateOfCharge,
    /// Switch or tap position
    #[serde(rename = "Pos")]
    Position,
}

impl MeasurementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementType::Current => "A",
            MeasurementType::Voltage => "PNV",
            MeasurementType::Power => "VA",
            MeasurementType::StateOfCharge => "SoC",
            MeasurementType::Position => "Pos",
        }
    }

    /// Analog or discrete storage class of this quantity
    pub fn kind(&self) -> MeasurementKind {
        match self {
            MeasurementType::Position => MeasurementKind::Discrete,
            _ => MeasurementKind::Analog,
        }
    }
}

impl fmt::Display for MeasurementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(MeasurementType::Current),
            "PNV" => Ok(MeasurementType::Voltage),
            "VA" => Ok(MeasurementType::Power),
            "SoC" => Ok(MeasurementType::StateOfCharge),
            "Pos" => Ok(MeasurementType::Position),
            _ => Err(ModelError::invalid_argument(
                "measurement type",
                format!("'{}'. Valid values: A, PNV, VA, SoC, Pos", s),
            )),
        }
    }
}

/// Measurement storage class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MeasurementKind {
    Analog,
    Discrete,
}

impl MeasurementKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            MeasurementKind::Analog => "Analog",
            MeasurementKind::Discrete => "Discrete",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

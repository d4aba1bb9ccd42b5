//! Schema context passed to every engine component

use crate::error::Result;
use cim_model::{CimProfile, ModelKind, TransformerTankEnd};
use std::collections::BTreeMap;

/// Profile, model kind and naming overrides for one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaContext {
    pub profile: CimProfile,
    pub model_kind: ModelKind,
    /// Structural measurement name -> stored display name
    display_names: BTreeMap<String, String>,
}

impl SchemaContext {
    pub fn new(profile: CimProfile, model_kind: ModelKind) -> Self {
        Self {
            profile,
            model_kind,
            display_names: BTreeMap::new(),
        }
    }

    /// Build from configuration tokens (`rc4_2021`, `busBranch`, ...)
    pub fn from_tokens(profile: &str, model_kind: &str) -> Result<Self> {
        Ok(Self::new(profile.parse()?, model_kind.parse()?))
    }

    pub fn with_display_names(mut self, display_names: BTreeMap<String, String>) -> Self {
        self.display_names = display_names;
        self
    }

    /// Display override for a structural measurement name
    pub fn display_name(&self, structural_name: &str) -> Option<&str> {
        self.display_names.get(structural_name).map(String::as_str)
    }

    /// Phase label of a tank end as exported by the active profile
    ///
    /// `rc4_2021` models carry a PhaseCode; `cimhub_2023` models carry an
    /// ordered phase string and fall back to the PhaseCode when it is absent.
    pub fn tank_end_phase_label<'a>(&self, end: &'a TransformerTankEnd) -> &'a str {
        match (self.profile, &end.ordered_phases) {
            (CimProfile::CimHub2023, Some(ordered)) => ordered.as_str(),
            _ => end.phases.as_str(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use cim_model::{OrderedPhaseCode, PhaseCode, TerminalId};

    fn tank_end(terminal: TerminalId) -> TransformerTankEnd {
        TransformerTankEnd {
            name: "end1".into(),
            terminal,
            phases: PhaseCode::Abc,
            ordered_phases: Some(OrderedPhaseCode::parse("BN").unwrap()),
            has_tap_changer: false,
        }
    }

    fn any_terminal() -> TerminalId {
        let mut graph = cim_model::GraphModel::new(cim_model::ModelInfo {
            mrid: "F".into(),
            name: "f".into(),
            kind: ModelKind::Feeder,
        });
        let eq = graph.add_equipment(
            "E",
            "e",
            cim_model::EquipmentKind::SynchronousMachine,
        );
        graph.add_terminal(eq, "T", "t", 1, None).unwrap()
    }

    #[test]
    fn test_tank_end_label_follows_profile() {
        let end = tank_end(any_terminal());

        let rc4 = SchemaContext::new(CimProfile::Rc4_2021, ModelKind::Feeder);
        assert_eq!(rc4.tank_end_phase_label(&end), "ABC");

        let cimhub = SchemaContext::new(CimProfile::CimHub2023, ModelKind::Feeder);
        assert_eq!(cimhub.tank_end_phase_label(&end), "BN");

        let mut bare = end.clone();
        bare.ordered_phases = None;
        assert_eq!(cimhub.tank_end_phase_label(&bare), "ABC");
    }

    #[test]
    fn test_from_tokens() {
        let ctx = SchemaContext::from_tokens("rc4_2021", "busBranch").unwrap();
        assert_eq!(ctx.profile, CimProfile::Rc4_2021);
        assert_eq!(ctx.model_kind, ModelKind::BusBranch);
        assert!(SchemaContext::from_tokens("rc5", "feeder").is_err());
    }

    #[test]
    fn test_display_names() {
        let mut names = BTreeMap::new();
        names.insert(
            "EnergyConsumer_load1_PNV_1_A".to_string(),
            "Load 1 voltage A".to_string(),
        );
        let ctx = SchemaContext::default().with_display_names(names);
        assert_eq!(
            ctx.display_name("EnergyConsumer_load1_PNV_1_A"),
            Some("Load 1 voltage A")
        );
        assert_eq!(ctx.display_name("EnergyConsumer_load1_VA_1_A"), None);
    }
}

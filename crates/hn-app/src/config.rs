//! YAML pipeline configuration.
//!
//! Serialized fields are plain numbers with their unit in the field name;
//! [`PipelineConfig`] converts them into the typed parameter structs each
//! stage consumes.

use std::path::Path;
use std::sync::Arc;

use hn_anatomy::{
    CatalogConfig, Discretization, Material, RadiusStatistic, VariantGate,
    circle_of_willis_gates,
};
use hn_core::Real;
use hn_core::units::{kg_per_m3, mm, pa, pa_s, to_mm};
use hn_graph::{
    AnatomicalInlet, ConnectorConfig, ConnectorRule, FixedInlet, InletPolicy, InletTier,
    circle_of_willis_rules,
};
use hn_model::{RunSettings, ValidatorOptions};
use hn_windkessel::{
    AlwaysSystemic, CircuitNaming, CoronaryNameHeuristic, TerminationClassifier, WindkesselParams,
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Network artifact id, also the geometry file stem.
    pub network_id: String,
    pub catalog: CatalogSection,
    pub material: Material,
    pub inlet: InletSection,
    pub connectors: ConnectorSection,
    /// Optional branches gated by the patient's variant map.
    pub variants: Vec<VariantGate>,
    pub windkessel: WindkesselSection,
    pub naming: CircuitNaming,
    pub run: RunSettings,
    pub validation: ValidatorOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            network_id: "arterial".to_string(),
            catalog: CatalogSection::default(),
            material: Material::default(),
            inlet: InletSection::default(),
            connectors: ConnectorSection::default(),
            variants: Vec::new(),
            windkessel: WindkesselSection::default(),
            naming: CircuitNaming::default(),
            run: RunSettings::default(),
            validation: ValidatorOptions::default(),
        }
    }
}

impl PipelineConfig {
    /// Connector closure rules and variant gates for Circle-of-Willis
    /// segmentations.
    pub fn circle_of_willis() -> Self {
        Self {
            connectors: ConnectorSection {
                rules: circle_of_willis_rules(),
                ..ConnectorSection::default()
            },
            variants: circle_of_willis_gates(),
            ..Self::default()
        }
    }

    pub fn catalog_config(&self) -> CatalogConfig {
        let c = &self.catalog;
        CatalogConfig {
            radius_statistic: c.radius_statistic,
            wall_fraction: c.wall_fraction,
            fallback_radius: mm(c.fallback_radius_mm),
            fallback_length: mm(c.fallback_length_mm),
            min_radius: mm(c.min_radius_mm),
            discretization: Discretization {
                min_points: c.min_points,
                mm_per_point: c.mm_per_point,
            },
            material: self.material,
            node_prefix: c.node_prefix.clone(),
            meta_entry_patterns: c.meta_entry_patterns.clone(),
            variant_gates: self.variants.clone(),
        }
    }

    pub fn connector_config(&self) -> ConnectorConfig {
        ConnectorConfig {
            length: mm(self.connectors.length_mm),
            divisions: self.connectors.divisions,
            use_landmark_distance: self.connectors.use_landmark_distance,
        }
    }

    pub fn windkessel_params(&self) -> WindkesselParams {
        self.windkessel.to_params()
    }

    /// Structural checks that do not need any input data.
    pub fn check(&self) -> AppResult<()> {
        if self.network_id.trim().is_empty() {
            return Err(AppError::Config("network_id must not be empty".to_string()));
        }
        if let InletSection::Fixed { node } = &self.inlet {
            if node.trim().is_empty() {
                return Err(AppError::Config("fixed inlet node is empty".to_string()));
            }
        }
        let c = &self.catalog;
        positive("catalog.wall_fraction", c.wall_fraction)?;
        positive("catalog.fallback_radius_mm", c.fallback_radius_mm)?;
        positive("catalog.fallback_length_mm", c.fallback_length_mm)?;
        positive("catalog.min_radius_mm", c.min_radius_mm)?;
        positive("connectors.length_mm", self.connectors.length_mm)?;
        if c.fallback_radius_mm < c.min_radius_mm {
            return Err(AppError::Config(format!(
                "catalog.fallback_radius_mm ({}) is below catalog.min_radius_mm ({})",
                c.fallback_radius_mm, c.min_radius_mm
            )));
        }
        // walls are written with micrometre resolution
        if c.wall_fraction * c.min_radius_mm < 1.0e-3 {
            return Err(AppError::Config(format!(
                "wall at the radius floor ({} mm) is thinner than 1 um",
                c.wall_fraction * c.min_radius_mm
            )));
        }
        self.windkessel_params().check()?;
        self.naming.check()?;
        Ok(())
    }

    pub fn from_yaml_str(content: &str) -> AppResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml_string(&self) -> AppResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

fn positive(field: &str, value: Real) -> AppResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "{} must be positive, got {}",
            field, value
        )))
    }
}

/// Load a configuration from a YAML file.
pub fn load_yaml(path: &Path) -> AppResult<PipelineConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| AppError::ConfigFileRead {
        path: path.to_path_buf(),
        source,
    })?;
    PipelineConfig::from_yaml_str(&content)
        .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))
}

/// Save a configuration to a YAML file.
pub fn save_yaml(path: &Path, config: &PipelineConfig) -> AppResult<()> {
    let content = config.to_yaml_string()?;
    std::fs::write(path, content).map_err(|source| AppError::ConfigFileWrite {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSection {
    pub radius_statistic: RadiusStatistic,
    pub wall_fraction: Real,
    pub fallback_radius_mm: Real,
    pub fallback_length_mm: Real,
    pub min_radius_mm: Real,
    pub min_points: u32,
    pub mm_per_point: Real,
    pub node_prefix: String,
    pub meta_entry_patterns: Vec<String>,
}

impl Default for CatalogSection {
    fn default() -> Self {
        let base = CatalogConfig::default();
        Self {
            radius_statistic: base.radius_statistic,
            wall_fraction: base.wall_fraction,
            fallback_radius_mm: to_mm(base.fallback_radius),
            fallback_length_mm: to_mm(base.fallback_length),
            min_radius_mm: to_mm(base.min_radius),
            min_points: base.discretization.min_points,
            mm_per_point: base.discretization.mm_per_point,
            node_prefix: base.node_prefix,
            meta_entry_patterns: base.meta_entry_patterns,
        }
    }
}

/// How the inlet node is designated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum InletSection {
    Fixed { node: String },
    Anatomical { tiers: Vec<InletTier> },
}

impl Default for InletSection {
    fn default() -> Self {
        InletSection::Anatomical {
            tiers: AnatomicalInlet::default().tiers,
        }
    }
}

impl InletSection {
    pub fn policy(&self) -> Arc<dyn InletPolicy> {
        match self {
            InletSection::Fixed { node } => Arc::new(FixedInlet::new(node.clone())),
            InletSection::Anatomical { tiers } => {
                Arc::new(AnatomicalInlet::with_tiers(tiers.clone()))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorSection {
    pub rules: Vec<ConnectorRule>,
    pub length_mm: Real,
    pub divisions: u32,
    pub use_landmark_distance: bool,
}

impl Default for ConnectorSection {
    fn default() -> Self {
        let base = ConnectorConfig::default();
        Self {
            rules: Vec::new(),
            length_mm: to_mm(base.length),
            divisions: base.divisions,
            use_landmark_distance: base.use_landmark_distance,
        }
    }
}

/// Which termination classifier the synthesizer uses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSection {
    CoronaryName { keywords: Vec<String> },
    AlwaysSystemic,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        ClassifierSection::CoronaryName {
            keywords: CoronaryNameHeuristic::default().keywords,
        }
    }
}

impl ClassifierSection {
    pub fn classifier(&self) -> Arc<dyn TerminationClassifier> {
        match self {
            ClassifierSection::CoronaryName { keywords } => Arc::new(CoronaryNameHeuristic {
                keywords: keywords.clone(),
            }),
            ClassifierSection::AlwaysSystemic => Arc::new(AlwaysSystemic),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindkesselSection {
    pub viscosity_pa_s: Real,
    pub density_kg_m3: Real,
    pub wall_modulus_pa: Real,
    pub wall_fraction: Real,
    pub proximal_fraction: Real,
    pub inertance_scale: Real,
    pub r_min: Real,
    pub c_min: Real,
    pub l_min: Real,
    pub min_radius_mm: Real,
    pub min_length_mm: Real,
    pub fallback_radius_mm: Real,
    pub fallback_length_mm: Real,
    pub initial_pressure_pa: Real,
    pub classifier: ClassifierSection,
}

impl Default for WindkesselSection {
    fn default() -> Self {
        Self::from_params(&WindkesselParams::default())
    }
}

impl WindkesselSection {
    pub fn from_params(p: &WindkesselParams) -> Self {
        Self {
            viscosity_pa_s: p.viscosity.value,
            density_kg_m3: p.density.value,
            wall_modulus_pa: p.wall_modulus.value,
            wall_fraction: p.wall_fraction,
            proximal_fraction: p.proximal_fraction,
            inertance_scale: p.inertance_scale,
            r_min: p.r_min,
            c_min: p.c_min,
            l_min: p.l_min,
            min_radius_mm: to_mm(p.min_radius),
            min_length_mm: to_mm(p.min_length),
            fallback_radius_mm: to_mm(p.fallback_radius),
            fallback_length_mm: to_mm(p.fallback_length),
            initial_pressure_pa: p.initial_pressure.value,
            classifier: ClassifierSection::default(),
        }
    }

    pub fn to_params(&self) -> WindkesselParams {
        WindkesselParams {
            viscosity: pa_s(self.viscosity_pa_s),
            density: kg_per_m3(self.density_kg_m3),
            wall_modulus: pa(self.wall_modulus_pa),
            wall_fraction: self.wall_fraction,
            proximal_fraction: self.proximal_fraction,
            inertance_scale: self.inertance_scale,
            r_min: self.r_min,
            c_min: self.c_min,
            l_min: self.l_min,
            min_radius: mm(self.min_radius_mm),
            min_length: mm(self.min_length_mm),
            fallback_radius: mm(self.fallback_radius_mm),
            fallback_length: mm(self.fallback_length_mm),
            initial_pressure: pa(self.initial_pressure_pa),
        }
    }
}

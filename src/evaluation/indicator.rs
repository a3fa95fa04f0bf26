use std::collections::BTreeSet;
use std::fmt;

use serde::{Serialize, Serializer};

/// The four FAIR principles an indicator can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Principle {
    Findable,
    Accessible,
    Interoperable,
    Reusable,
}

impl Principle {
    pub const ALL: [Principle; 4] = [
        Principle::Findable,
        Principle::Accessible,
        Principle::Interoperable,
        Principle::Reusable,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Principle::Findable => "findable",
            Principle::Accessible => "accessible",
            Principle::Interoperable => "interoperable",
            Principle::Reusable => "reusable",
        }
    }
}

/// RDA priority of an indicator. Informational only; it never changes a mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Essential,
    Recommended,
    Optional,
}

macro_rules! indicators {
    ($($variant:ident => $code:literal, $weight:ident, $summary:literal;)+) => {
        /// Indicators of the RDA FAIR Data Maturity Model evaluated by the engine.
        #[allow(non_camel_case_types)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum IndicatorId {
            $($variant,)+
        }

        impl IndicatorId {
            pub const ALL: &'static [IndicatorId] = &[$(IndicatorId::$variant,)+];

            /// Short code, e.g. `F1-01M`.
            pub fn code(&self) -> &'static str {
                match self {
                    $(IndicatorId::$variant => $code,)+
                }
            }

            pub fn weight(&self) -> Weight {
                match self {
                    $(IndicatorId::$variant => Weight::$weight,)+
                }
            }

            pub fn summary(&self) -> &'static str {
                match self {
                    $(IndicatorId::$variant => $summary,)+
                }
            }
        }
    };
}

indicators! {
    F1_01M => "F1-01M", Essential, "Metadata is identified by a persistent identifier";
    F1_01D => "F1-01D", Essential, "Data is identified by a persistent identifier";
    F1_02M => "F1-02M", Essential, "Metadata is identified by a globally unique identifier";
    F1_02D => "F1-02D", Essential, "Data is identified by a globally unique identifier";
    F2_01M => "F2-01M", Essential, "Rich metadata is provided to allow discovery";
    F3_01M => "F3-01M", Essential, "Metadata includes the identifier for the data";
    F4_01M => "F4-01M", Essential, "Metadata is offered in such a way that it can be harvested and indexed";
    A1_01M => "A1-01M", Recommended, "Metadata contains information to enable the user to get access to the data";
    A1_02M => "A1-02M", Essential, "Metadata can be accessed manually";
    A1_02D => "A1-02D", Essential, "Data can be accessed manually";
    A1_03M => "A1-03M", Essential, "Metadata identifier resolves to a metadata record";
    A1_03D => "A1-03D", Essential, "Data identifier resolves to a digital object";
    A1_04M => "A1-04M", Essential, "Metadata is accessed through standardised protocol";
    A1_04D => "A1-04D", Essential, "Data is accessible through standardised protocol";
    A1_05D => "A1-05D", Recommended, "Data can be accessed automatically";
    A1_1_01M => "A1.1-01M", Essential, "Metadata is accessible through a free access protocol";
    A1_1_01D => "A1.1-01D", Recommended, "Data is accessible through a free access protocol";
    A1_2_01D => "A1.2-01D", Optional, "Data is accessible through an access protocol that supports authentication and authorisation";
    A2_01M => "A2-01M", Essential, "Metadata is guaranteed to remain available after data is no longer available";
    I1_01M => "I1-01M", Recommended, "Metadata uses knowledge representation expressed in standardised format";
    I1_01D => "I1-01D", Recommended, "Data uses knowledge representation expressed in standardised format";
    I1_02M => "I1-02M", Recommended, "Metadata uses machine-understandable knowledge representation";
    I1_02D => "I1-02D", Recommended, "Data uses machine-understandable knowledge representation";
    I2_01M => "I2-01M", Recommended, "Metadata uses FAIR-compliant vocabularies";
    I2_01D => "I2-01D", Optional, "Data uses FAIR-compliant vocabularies";
    I3_01M => "I3-01M", Recommended, "Metadata includes references to other metadata";
    I3_01D => "I3-01D", Optional, "Data includes references to other data";
    I3_02M => "I3-02M", Optional, "Metadata includes references to other data";
    I3_02D => "I3-02D", Optional, "Data includes qualified references to other data";
    I3_03M => "I3-03M", Recommended, "Metadata includes qualified references to other metadata";
    I3_04M => "I3-04M", Optional, "Metadata includes qualified references to other data";
    R1_01M => "R1-01M", Essential, "Plurality of accurate and relevant attributes are provided to allow reuse";
    R1_1_01M => "R1.1-01M", Essential, "Metadata includes information about the licence under which the data can be reused";
    R1_1_02M => "R1.1-02M", Recommended, "Metadata refers to a standard reuse licence";
    R1_1_03M => "R1.1-03M", Recommended, "Metadata refers to a machine-understandable reuse licence";
    R1_2_01M => "R1.2-01M", Recommended, "Metadata includes provenance information according to community-specific standards";
    R1_2_02M => "R1.2-02M", Optional, "Metadata includes provenance information according to a cross-community language";
    R1_3_01M => "R1.3-01M", Essential, "Metadata complies with a community standard";
    R1_3_01D => "R1.3-01D", Essential, "Data complies with a community standard";
    R1_3_02M => "R1.3-02M", Recommended, "Metadata is expressed in compliance with a machine-understandable community standard";
    R1_3_02D => "R1.3-02D", Recommended, "Data is expressed in compliance with a machine-understandable community standard";
}

impl IndicatorId {
    /// Owning principle, from the first letter of the code.
    pub fn principle(&self) -> Principle {
        match self.code().as_bytes().first() {
            Some(b'F') => Principle::Findable,
            Some(b'A') => Principle::Accessible,
            Some(b'I') => Principle::Interoperable,
            _ => Principle::Reusable,
        }
    }

    /// Accepts `F1-01M`, `RDA-F1-01M` or `rda_f1_01m`.
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_uppercase().replace('_', "-");
        let code = normalized.strip_prefix("RDA-").unwrap_or(&normalized);
        IndicatorId::ALL.iter().copied().find(|id| {
            id.code() == code || id.code().replace('.', "-") == code
        })
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RDA-{}", self.code())
    }
}

impl Serialize for IndicatorId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What an indicator function returns before the engine validates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorOutcome {
    pub points: u32,
    pub message: String,
    /// Vocabularies whose fallback snapshot decided part of this outcome.
    pub degraded_vocabularies: BTreeSet<String>,
}

impl IndicatorOutcome {
    pub fn new(points: u32, message: impl Into<String>) -> Self {
        Self {
            points,
            message: message.into(),
            degraded_vocabularies: BTreeSet::new(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(100, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(0, message)
    }

    pub fn with_degraded(mut self, vocabularies: impl IntoIterator<Item = String>) -> Self {
        self.degraded_vocabularies.extend(vocabularies);
        self
    }
}

/// Validated, reportable result of one indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorResult {
    pub id: IndicatorId,
    pub principle: Principle,
    pub weight: Weight,
    pub points: u8,
    pub message: String,
}

impl IndicatorResult {
    pub fn new(id: IndicatorId, points: u8, message: impl Into<String>) -> Self {
        Self {
            id,
            principle: id.principle(),
            weight: id.weight(),
            points,
            message: message.into(),
        }
    }

    pub fn status(&self) -> IndicatorStatus {
        match self.points {
            100..=u8::MAX => IndicatorStatus::Pass,
            0 => IndicatorStatus::Fail,
            _ => IndicatorStatus::Partial,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorStatus {
    Pass,
    Partial,
    Fail,
}

/// A misbehaving indicator implementation. Reported as 0 points; never aborts the evaluation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndicatorEvaluationError {
    #[error("{indicator} failed: {reason}")]
    Failed { indicator: IndicatorId, reason: String },
    #[error("{indicator} returned {points} points, outside 0..=100")]
    PointsOutOfRange { indicator: IndicatorId, points: u32 },
    #[error("{indicator} panicked: {reason}")]
    Panicked { indicator: IndicatorId, reason: String },
}

impl IndicatorEvaluationError {
    pub fn indicator(&self) -> IndicatorId {
        match self {
            IndicatorEvaluationError::Failed { indicator, .. }
            | IndicatorEvaluationError::PointsOutOfRange { indicator, .. }
            | IndicatorEvaluationError::Panicked { indicator, .. } => *indicator,
        }
    }
}

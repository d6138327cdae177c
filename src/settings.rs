use std::fmt;

/// Java source level (`8`, `16`, `21`, ...)
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JavaVersion(pub u8);

impl JavaVersion {
    pub const JAVA_8: JavaVersion = JavaVersion(8);
    pub const JAVA_16: JavaVersion = JavaVersion(16);
    pub const JAVA_17: JavaVersion = JavaVersion(17);
    pub const JAVA_21: JavaVersion = JavaVersion(21);
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Language features that pattern scoping depends on
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Feature {
    PatternMatchingInstanceof,
    RecordPatterns,
    PatternMatchingSwitch,
}

impl Feature {
    /// Name used in diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Feature::PatternMatchingInstanceof => "Pattern Matching in instanceof Expressions",
            Feature::RecordPatterns => "Record Patterns",
            Feature::PatternMatchingSwitch => "Pattern Matching in Switch",
        }
    }

    /// First source level where the feature is standard
    pub fn since(self) -> JavaVersion {
        match self {
            Feature::PatternMatchingInstanceof => JavaVersion(16),
            Feature::RecordPatterns => JavaVersion(21),
            Feature::PatternMatchingSwitch => JavaVersion(21),
        }
    }

    /// First source level where the feature is available with `--enable-preview`
    pub fn preview_since(self) -> JavaVersion {
        match self {
            Feature::PatternMatchingInstanceof => JavaVersion(14),
            Feature::RecordPatterns => JavaVersion(19),
            Feature::PatternMatchingSwitch => JavaVersion(17),
        }
    }
}

pub struct Settings {
    /// Source level of the code being analyzed
    pub source_level: JavaVersion,

    /// Accept features that are still in preview at the source level
    pub enable_preview: bool,

    /// Report case labels dominated by an earlier label
    ///
    /// Dominance needs subtyping information, so this can be turned off when no type hierarchy is
    /// available.
    pub check_dominance: bool,
}

impl Settings {
    pub fn new() -> Settings {
        Settings {
            source_level: JavaVersion::JAVA_21,
            enable_preview: false,
            check_dominance: true,
        }
    }

    pub fn with_source_level(source_level: JavaVersion) -> Settings {
        Settings {
            source_level,
            ..Settings::new()
        }
    }

    pub fn supports(&self, feature: Feature) -> bool {
        self.source_level >= feature.since()
            || (self.enable_preview && self.source_level >= feature.preview_since())
    }
}

impl Default for Settings {
    fn default() -> Settings {
        Settings::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn feature_gates() {
        let java8 = Settings::with_source_level(JavaVersion::JAVA_8);
        assert!(!java8.supports(Feature::PatternMatchingInstanceof));

        let java17 = Settings::with_source_level(JavaVersion::JAVA_17);
        assert!(java17.supports(Feature::PatternMatchingInstanceof));
        assert!(!java17.supports(Feature::PatternMatchingSwitch));
        assert!(!java17.supports(Feature::RecordPatterns));

        let preview17 = Settings {
            enable_preview: true,
            ..Settings::with_source_level(JavaVersion::JAVA_17)
        };
        assert!(preview17.supports(Feature::PatternMatchingSwitch));
        assert!(!preview17.supports(Feature::RecordPatterns));

        assert!(Settings::new().supports(Feature::RecordPatterns));
    }
}

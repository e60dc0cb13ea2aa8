//! Java language level and the source features it enables.
//!
//! Assists consult this model before offering rewrites that introduce newer
//! syntax (`var`, lambdas, diamonds) into a file.

use serde::{Deserialize, Serialize};

/// The effective Java language mode for a file.
///
/// - `major`: the Java feature release number (7, 8, 11, 17, 21, …)
/// - `preview`: whether `--enable-preview` is in effect for this major version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JavaLanguageLevel {
    pub major: u16,
    #[serde(default)]
    pub preview: bool,
}

impl JavaLanguageLevel {
    pub const JAVA_7: Self = Self::new(7);
    pub const JAVA_8: Self = Self::new(8);
    pub const JAVA_10: Self = Self::new(10);
    pub const JAVA_11: Self = Self::new(11);
    pub const JAVA_17: Self = Self::new(17);
    pub const JAVA_21: Self = Self::new(21);

    pub const fn new(major: u16) -> Self {
        Self {
            major,
            preview: false,
        }
    }

    #[inline]
    pub const fn with_preview(self, preview: bool) -> Self {
        Self { preview, ..self }
    }

    pub fn availability(self, feature: JavaFeature) -> FeatureAvailability {
        match feature.preview_since() {
            Some(preview) if self.major >= preview && self.major < feature.stable_since() => {
                FeatureAvailability::Preview
            }
            _ if self.major >= feature.stable_since() => FeatureAvailability::Stable,
            _ => FeatureAvailability::Unavailable,
        }
    }

    /// Is the feature usable in this configuration? (applies `preview` flag)
    pub fn is_enabled(self, feature: JavaFeature) -> bool {
        match self.availability(feature) {
            FeatureAvailability::Stable => true,
            FeatureAvailability::Preview => self.preview,
            FeatureAvailability::Unavailable => false,
        }
    }

    #[inline]
    pub fn supports_lambdas(self) -> bool {
        self.is_enabled(JavaFeature::Lambdas)
    }

    #[inline]
    pub fn supports_var_local_inference(self) -> bool {
        self.is_enabled(JavaFeature::VarLocalInference)
    }

    #[inline]
    pub fn supports_diamond(self) -> bool {
        self.is_enabled(JavaFeature::Diamond)
    }
}

impl Default for JavaLanguageLevel {
    fn default() -> Self {
        JavaLanguageLevel::JAVA_21
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JavaFeature {
    Diamond,           // Java 7
    MultiCatch,        // Java 7
    TryWithResources,  // Java 7
    Lambdas,           // Java 8, method references included
    StaticInterfaceMethods, // Java 8
    VarLocalInference, // Java 10
    VarLambdaParameters, // Java 11
    SwitchExpressions, // final Java 14 (preview 12/13)
    TextBlocks,        // final Java 15 (preview 13/14)
    Records,           // final Java 16 (preview 14/15)
}

impl JavaFeature {
    pub const fn stable_since(self) -> u16 {
        match self {
            JavaFeature::Diamond | JavaFeature::MultiCatch | JavaFeature::TryWithResources => 7,
            JavaFeature::Lambdas | JavaFeature::StaticInterfaceMethods => 8,
            JavaFeature::VarLocalInference => 10,
            JavaFeature::VarLambdaParameters => 11,
            JavaFeature::SwitchExpressions => 14,
            JavaFeature::TextBlocks => 15,
            JavaFeature::Records => 16,
        }
    }

    pub const fn preview_since(self) -> Option<u16> {
        match self {
            JavaFeature::SwitchExpressions => Some(12),
            JavaFeature::TextBlocks => Some(13),
            JavaFeature::Records => Some(14),
            _ => None,
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            JavaFeature::Diamond => "diamond operator",
            JavaFeature::MultiCatch => "multi-catch",
            JavaFeature::TryWithResources => "try-with-resources",
            JavaFeature::Lambdas => "lambda expressions",
            JavaFeature::StaticInterfaceMethods => "static interface methods",
            JavaFeature::VarLocalInference => "local variable type inference (`var`)",
            JavaFeature::VarLambdaParameters => "`var` lambda parameters",
            JavaFeature::SwitchExpressions => "switch expressions",
            JavaFeature::TextBlocks => "text blocks",
            JavaFeature::Records => "records",
        }
    }
}

/// Whether the *language* supports a feature in this major version,
/// independent of whether preview is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureAvailability {
    Unavailable,
    Preview,
    Stable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn var_requires_java_10() {
        assert!(!JavaLanguageLevel::JAVA_8.supports_var_local_inference());
        assert!(JavaLanguageLevel::JAVA_10.supports_var_local_inference());
        assert!(JavaLanguageLevel::JAVA_8.supports_lambdas());
        assert!(!JavaLanguageLevel::JAVA_7.supports_lambdas());
    }

    #[test]
    fn preview_features_need_the_flag() {
        let level = JavaLanguageLevel::new(13);
        assert_eq!(
            level.availability(JavaFeature::TextBlocks),
            FeatureAvailability::Preview
        );
        assert!(!level.is_enabled(JavaFeature::TextBlocks));
        assert!(level.with_preview(true).is_enabled(JavaFeature::TextBlocks));
        assert_eq!(
            JavaLanguageLevel::new(11).availability(JavaFeature::TextBlocks),
            FeatureAvailability::Unavailable
        );
    }
}

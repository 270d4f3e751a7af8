//! Gatherer capability traits.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::CapabilityError;

/// Pass phases a gatherer hooks into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatherPhases {
    pub before_pass: bool,
    pub pass: bool,
    pub after_pass: bool,
}

impl GatherPhases {
    pub const ALL: GatherPhases = GatherPhases {
        before_pass: true,
        pass: true,
        after_pass: true,
    };

    /// Reads page state once loading has settled.
    pub const AFTER_PASS: GatherPhases = GatherPhases {
        before_pass: false,
        pass: false,
        after_pass: true,
    };

    pub const NONE: GatherPhases = GatherPhases {
        before_pass: false,
        pass: false,
        after_pass: false,
    };

    /// True when the gatherer would never run.
    pub fn is_empty(&self) -> bool {
        !(self.before_pass || self.pass || self.after_pass)
    }
}

impl Default for GatherPhases {
    fn default() -> Self {
        Self::ALL
    }
}

/// A constructed gatherer, ready to be driven by the collection pipeline.
pub trait Gatherer: fmt::Debug + Send + Sync {
    /// Name of the artifact this gatherer produces.
    fn name(&self) -> &str;

    /// Phases of a pass this gatherer participates in.
    fn phases(&self) -> GatherPhases {
        GatherPhases::ALL
    }
}

/// Something that can produce gatherer instances.
pub trait GathererFactory: fmt::Debug + Send + Sync {
    /// Implementation name, used in diagnostics and serialized configs.
    fn name(&self) -> &str;

    /// Construct a fresh instance.
    fn create(&self) -> Arc<dyn Gatherer>;
}

/// Factory over an instance that was built by the caller.
///
/// `create` hands out the same instance every time.
#[derive(Debug, Clone)]
pub struct InstanceFactory {
    instance: Arc<dyn Gatherer>,
}

impl InstanceFactory {
    pub fn new(instance: Arc<dyn Gatherer>) -> Self {
        Self { instance }
    }

    pub fn instance(&self) -> &Arc<dyn Gatherer> {
        &self.instance
    }
}

impl GathererFactory for InstanceFactory {
    fn name(&self) -> &str {
        self.instance.name()
    }

    fn create(&self) -> Arc<dyn Gatherer> {
        Arc::clone(&self.instance)
    }
}

/// Check that a gatherer exposes the minimal capability surface.
pub fn check_gatherer(gatherer: &dyn Gatherer) -> Result<(), CapabilityError> {
    let name = gatherer.name();
    if name.trim().is_empty() {
        return Err(CapabilityError::EmptyArtifactName);
    }
    if gatherer.phases().is_empty() {
        return Err(CapabilityError::NoPhases(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Stub {
        name: &'static str,
        phases: GatherPhases,
    }

    impl Gatherer for Stub {
        fn name(&self) -> &str {
            self.name
        }

        fn phases(&self) -> GatherPhases {
            self.phases
        }
    }

    #[test]
    fn test_valid_gatherer_passes_check() {
        let g = Stub {
            name: "ViewportDimensions",
            phases: GatherPhases::AFTER_PASS,
        };
        assert!(check_gatherer(&g).is_ok());
    }

    #[test]
    fn test_empty_name_rejected() {
        let g = Stub {
            name: "  ",
            phases: GatherPhases::ALL,
        };
        assert_eq!(check_gatherer(&g), Err(CapabilityError::EmptyArtifactName));
    }

    #[test]
    fn test_no_phases_rejected() {
        let g = Stub {
            name: "Idle",
            phases: GatherPhases::NONE,
        };
        assert_eq!(
            check_gatherer(&g),
            Err(CapabilityError::NoPhases("Idle".to_string()))
        );
    }

    #[test]
    fn test_instance_factory_reuses_instance() {
        let instance: Arc<dyn Gatherer> = Arc::new(Stub {
            name: "MetaElements",
            phases: GatherPhases::AFTER_PASS,
        });
        let factory = InstanceFactory::new(Arc::clone(&instance));

        assert_eq!(factory.name(), "MetaElements");
        assert!(Arc::ptr_eq(&factory.create(), &instance));
        assert!(Arc::ptr_eq(&factory.create(), factory.instance()));
    }
}

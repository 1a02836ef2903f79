mod endpoint;
mod payload;
mod template;


use rand::Rng;
use rand::distributions::{Distribution, WeightedIndex};

use crate::error::ConfigError;

pub use endpoint::{Classification, Endpoint, RequestContext};
pub use payload::ErrorVariant;
pub use template::TemplateVars;

#[cfg(feature = "fuzzing")]
pub(crate) use template::render_template;

/// Weighted set of endpoints. Selection probability is `weight / total`.
#[derive(Debug)]
pub struct EndpointCatalog {
    endpoints: Vec<Endpoint>,
    index: WeightedIndex<f64>,
}

impl EndpointCatalog {
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyCatalog`] for an empty list and
    /// [`ConfigError::InvalidWeights`] when the weights cannot be normalized.
    pub fn new(endpoints: Vec<Endpoint>) -> Result<Self, ConfigError> {
        if endpoints.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        for endpoint in &endpoints {
            if !endpoint.weight().is_finite() || endpoint.weight() <= 0.0 {
                return Err(ConfigError::InvalidWeight {
                    name: endpoint.name().to_owned(),
                    weight: endpoint.weight(),
                });
            }
        }
        let index = WeightedIndex::new(endpoints.iter().map(Endpoint::weight)).map_err(
            |err| ConfigError::InvalidWeights {
                reason: err.to_string(),
            },
        )?;
        Ok(Self { endpoints, index })
    }

    /// Draws one endpoint. Draws are independent of each other.
    #[expect(
        clippy::indexing_slicing,
        reason = "WeightedIndex only yields indices below the endpoint count"
    )]
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> &Endpoint {
        &self.endpoints[self.index.sample(rng)]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Endpoint> {
        self.endpoints.iter()
    }
}

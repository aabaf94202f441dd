//! Shared product container
use std::collections::BTreeMap;

use parking_lot::{Mutex, MutexGuard};

use crate::{
    navigation::DilutionOfPrecision,
    prelude::{Epoch, Vector3},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type of [Product]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ProductType {
    /// ECEF coordinates (m)
    Coordinates,
    /// Receiver clock offset (m)
    ClockOffset,
    /// [DilutionOfPrecision]
    Dop,
    /// Total zenith wet delay (m)
    ZenithWetDelay,
}

/// Computed [Product]
#[derive(Debug, Clone, PartialEq)]
pub enum Product {
    Coordinates(Vector3<f64>),
    ClockOffset(f64),
    Dop(DilutionOfPrecision),
    ZenithWetDelay(f64),
}

impl Product {
    /// [ProductType] of this [Product]
    pub fn product_type(&self) -> ProductType {
        match self {
            Self::Coordinates(_) => ProductType::Coordinates,
            Self::ClockOffset(_) => ProductType::ClockOffset,
            Self::Dop(_) => ProductType::Dop,
            Self::ZenithWetDelay(_) => ProductType::ZenithWetDelay,
        }
    }
}

/// [Product] identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ProductKey {
    pub site: String,
    pub product: ProductType,
    pub epoch: Epoch,
}

impl ProductKey {
    pub fn new(site: &str, product: ProductType, epoch: Epoch) -> Self {
        Self {
            product,
            epoch,
            site: site.to_string(),
        }
    }
}

/// [ProductStore] may be shared between processors running in parallel.
/// Each call locks the container once, and releases it on return.
#[derive(Debug, Default)]
pub struct ProductStore {
    inner: Mutex<BTreeMap<ProductKey, Product>>,
}

impl ProductStore {
    fn lock(&self) -> MutexGuard<'_, BTreeMap<ProductKey, Product>> {
        self.inner.lock()
    }

    /// Stores new [Product], returns the one it replaced, if any.
    pub fn add(&self, site: &str, epoch: Epoch, product: Product) -> Option<Product> {
        let key = ProductKey::new(site, product.product_type(), epoch);
        self.lock().insert(key, product)
    }

    /// Removes this [Product]
    pub fn remove(&self, key: &ProductKey) -> Option<Product> {
        self.lock().remove(key)
    }

    /// Returns a copy of this [Product]
    pub fn get(&self, key: &ProductKey) -> Option<Product> {
        self.lock().get(key).cloned()
    }

    /// Total number of products
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of products stored for this site
    pub fn site_len(&self, site: &str) -> usize {
        self.lock().keys().filter(|k| k.site == site).count()
    }
}

#[cfg(test)]
mod test {
    use super::{Product, ProductKey, ProductStore, ProductType};
    use crate::prelude::{Epoch, Vector3};
    use std::sync::Arc;

    #[test]
    fn store() {
        let store = ProductStore::default();
        let t = Epoch::from_gpst_seconds(1.0E9);

        assert!(store
            .add("SITE", t, Product::Coordinates(Vector3::new(1.0, 2.0, 3.0)))
            .is_none());
        assert!(store.add("SITE", t, Product::ClockOffset(10.0)).is_none());
        assert_eq!(
            store.add("SITE", t, Product::ClockOffset(20.0)),
            Some(Product::ClockOffset(10.0))
        );
        assert_eq!(store.len(), 2);

        let key = ProductKey::new("SITE", ProductType::ClockOffset, t);
        assert_eq!(store.get(&key), Some(Product::ClockOffset(20.0)));
        assert_eq!(store.remove(&key), Some(Product::ClockOffset(20.0)));
        assert!(store.get(&key).is_none());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn concurrent_writers() {
        let store = Arc::new(ProductStore::default());
        let t0 = Epoch::from_gpst_seconds(1.0E9);

        let handles = (0..4)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    let site = format!("S{:03}", i);
                    for k in 0..100 {
                        let t = t0 + hifitime::Duration::from_seconds(k as f64 * 30.0);
                        store.add(&site, t, Product::ClockOffset(k as f64));
                    }
                })
            })
            .collect::<Vec<_>>();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 400);
        assert_eq!(store.site_len("S002"), 100);
    }
}

//! Asset pack configuration.
//!
//! - authored, hierarchical form: [`AssetPack`], [`Subgroup`]
//! - positional form consumed by filtering and generation:
//!   [`FlattenedAssetPack`], built by [`Flattener`]
//!
//! A pack with `n` enabled top-level subgroups produces combinations of
//! exactly `n` subgroups, one leaf from each top-level subtree.

mod flatten;
mod types;

pub use flatten::{
    flatten_asset_pack, FlattenOutput, FlattenedAssetPack, FlattenedRules, FlattenedSubgroup,
    Flattener, DISTRIBUTION_RULES_ID,
};
pub use types::{
    AssetPack, BodyShapeDescriptor, EligibilityRules, RaceGroupings, Subgroup, WeightRange,
};

// Knowledge base - the durable, versioned registry of recognized products.
//
// Snapshots are immutable values. The matcher classifies clusters against
// one snapshot; the versioner produces child snapshots as pure appends;
// the store persists each version in its own directory and publishes new
// versions atomically.

pub mod matcher;
pub mod models;
pub mod store;
pub mod versioner;

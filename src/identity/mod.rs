//! Identifier synthesis module
//!
//! Guarantees every canonical row carries an `order_id`. Rows without one
//! get `{customer_id}_{order_date}_{seq}` where `seq` comes from a
//! batch-local counter owned by the pipeline driver.
//!
//! Workers reserve disjoint contiguous ranges up front, so the sequence a
//! row receives depends only on its position in the batch, not on thread
//! scheduling. Sequences are unique within one run only.

mod sequence;
mod synthesizer;

pub use sequence::{SequenceCounter, SequenceRange};
pub use synthesizer::{
    synthesize_order_id, IdentifierSynthesizer, Identified, CUSTOMER_PLACEHOLDER, ID_SEPARATOR,
};

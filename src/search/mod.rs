//! Search Module
//!
//! Client for the EBI Search (EB-eye) REST service plus plain-text renderers
//! for its responses:
//! - [`EbeyeClient`] issues the queries
//! - [`format`] turns domains, entries, facets and terms into printable text

pub mod ebeye;
pub mod format;

pub use ebeye::{
    split_list, Domain, EbeyeClient, Entry, Facet, SearchError, SearchQuery, SearchResult, TopTerm,
};

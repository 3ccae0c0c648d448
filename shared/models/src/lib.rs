//! # bomtree Core Domain Models
//!
//! Data structures shared by the loader, resolver and aggregator.
//!
//! ## Key Models
//!
//! - **PartRecord**: one row of the master parts catalog with its open attribute bag
//! - **AssemblyTable / AssemblyRow**: the raw line items of one assembly
//! - **Node**: a resolved tree node, one of assembly, part or reference
//!
//! All models implement serde serialization; identifiers are checked with the
//! validator crate.

pub mod part;
pub mod assembly;
pub mod node;


pub use part::*;
pub use assembly::*;
pub use node::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_part_serialization() {
        let part = PartRecord::new("17954-1").with_attribute("description", "Wheel");
        let json = serde_json::to_string(&part).unwrap();
        let back: PartRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(part, back);
    }

    #[test]
    fn test_item_type_serializes_lowercase() {
        let json = serde_json::to_string(&ItemType::Assembly).unwrap();
        assert_eq!(json, "\"assembly\"");
    }
}

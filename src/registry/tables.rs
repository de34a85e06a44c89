//! Provider taxonomy tables.
//!
//! Column order is part of the published array contract: reordering these
//! tables changes the meaning of every previously written file.

/// Production types (ENTSO-E `psrType`) in generation-all column order.
pub const PRODUCTION_TYPES: [(&str, &str); 21] = [
    ("B02", "Fossil Brown coal/Lignite"),
    ("B03", "Fossil Coal-derived gas"),
    ("B04", "Fossil Gas"),
    ("B05", "Fossil Hard coal"),
    ("B06", "Fossil Oil"),
    ("B07", "Fossil Oil shale"),
    ("B08", "Fossil Peat"),
    ("B01", "Biomass"),
    ("B09", "Geothermal"),
    ("B11", "Hydro Run-of-river and poundage"),
    ("B12", "Hydro Water Reservoir"),
    ("B13", "Marine"),
    ("B15", "Other renewable"),
    ("B16", "Solar"),
    ("B18", "Wind Offshore"),
    ("B19", "Wind Onshore"),
    ("B10", "Hydro Pumped Storage"),
    ("B14", "Nuclear"),
    ("B17", "Waste"),
    ("B20", "Other"),
    ("B25", "Energy storage"),
];

/// Production types in generation-subset column order.
pub const GENERATION_SUBSET: [&str; 2] = ["B05", "B01"];

pub const FLOW_IMPORT: &str = "IMPORT";
pub const FLOW_EXPORT: &str = "EXPORT";

/// Flow directions in flow column order, seen from the zone being built.
pub const FLOW_DIRECTIONS: [(&str, &str); 2] = [
    (FLOW_IMPORT, "Import to zone (flow from counterpart into zone)"),
    (FLOW_EXPORT, "Export from zone (flow from zone to counterpart)"),
];

/// Provider description of a production type code.
pub fn production_type_name(code: &str) -> Option<&'static str> {
    PRODUCTION_TYPES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

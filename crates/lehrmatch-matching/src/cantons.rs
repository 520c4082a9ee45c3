/// Geographic neighbors for each of the 26 Swiss cantons. The feed widens a
/// student's search region to their canton plus its neighbors.
pub fn neighbors(canton: &str) -> &'static [&'static str] {
    match canton {
        "ZH" => &["SH", "TG", "SG", "SZ", "ZG", "AG", "LU"],
        "BE" => &["SO", "JU", "NE", "FR", "VS", "LU", "NW", "OW", "AG"],
        "LU" => &["BE", "OW", "NW", "UR", "SZ", "ZG", "AG", "ZH"],
        "UR" => &["SZ", "NW", "OW", "BE", "GR", "TI", "LU"],
        "SZ" => &["ZH", "ZG", "LU", "UR", "GL", "SG"],
        "OW" => &["BE", "NW", "LU"],
        "NW" => &["OW", "LU", "UR"],
        "GL" => &["SZ", "SG", "GR", "UR"],
        "ZG" => &["ZH", "LU", "SZ"],
        "FR" => &["BE", "NE", "VD"],
        "SO" => &["BE", "AG", "BL", "JU"],
        "BS" => &["BL"],
        "BL" => &["BS", "SO", "AG", "JU"],
        "SH" => &["ZH", "TG"],
        "AR" => &["AI", "SG"],
        "AI" => &["AR", "SG"],
        "SG" => &["ZH", "TG", "AR", "AI", "GR", "GL", "SZ"],
        "GR" => &["SG", "GL", "UR", "TI"],
        "AG" => &["ZH", "ZG", "LU", "BE", "SO", "BL"],
        "TG" => &["ZH", "SH", "SG"],
        "TI" => &["GR", "UR", "VS"],
        "VD" => &["FR", "NE", "GE", "VS"],
        "VS" => &["VD", "BE", "TI"],
        "NE" => &["VD", "FR", "BE", "JU"],
        "GE" => &["VD"],
        "JU" => &["NE", "BE", "SO", "BL"],
        _ => &[],
    }
}

/// The student's canton plus its neighbors, as the feed's search region.
pub fn search_region(canton: &str) -> Vec<String> {
    let mut region = vec![canton.to_string()];
    region.extend(neighbors(canton).iter().map(|c| c.to_string()));
    region
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zurich_borders_aargau() {
        assert!(neighbors("ZH").contains(&"AG"));
        assert!(neighbors("AG").contains(&"ZH"));
    }

    #[test]
    fn unknown_canton_has_no_neighbors() {
        assert!(neighbors("XX").is_empty());
    }

    #[test]
    fn search_region_includes_own_canton_first() {
        let region = search_region("GE");
        assert_eq!(region[0], "GE");
        assert!(region.contains(&"VD".to_string()));
    }
}

// file: src/openstack/table.rs
// version: 1.0.0
// guid: 5d8f0b07-1f55-4a57-9f5a-8a3c6a2e8e1d

//! Parsing of the `+----+` bordered tables the OpenStack clients print

/// Data rows of a CLI table, header excluded, cells trimmed
pub fn rows(output: &str) -> Vec<Vec<String>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|'))
        .skip(1)
        .map(|line| {
            line.trim_matches('|')
                .split('|')
                .map(|cell| cell.trim().to_string())
                .collect()
        })
        .collect()
}

/// First column of every data row
pub fn ids(output: &str) -> Vec<String> {
    rows(output)
        .into_iter()
        .filter_map(|row| row.into_iter().next())
        .filter(|id| !id.is_empty())
        .collect()
}

/// Id of the first row with a cell exactly equal to `name`
pub fn find_id(output: &str, name: &str) -> Option<String> {
    rows(output)
        .into_iter()
        .find(|row| row.iter().skip(1).any(|cell| cell == name))
        .and_then(|row| row.into_iter().next())
}

/// Whether any data row has a cell exactly equal to `name`
pub fn contains_name(output: &str, name: &str) -> bool {
    rows(output)
        .iter()
        .any(|row| row.iter().any(|cell| cell == name))
}

#[cfg(test)]
mod tests {
    use super::*;

    const NET_LIST: &str = "\
+--------------------------------------+---------+-------------------------------------------------------+
| id                                   | name    | subnets                                               |
+--------------------------------------+---------+-------------------------------------------------------+
| 0f8e2c54-8f2c-4c41-9a2f-3b1f0b8b2a01 | vlan208 | 5a1d... 129.128.208.0/24                              |
| 7c4b9d10-5d3e-4f0a-8b6e-2d9e1c3f4a55 | vlan2080 | 9b2e... 10.0.0.0/24                                  |
| c2a1f3e4-0b5d-4e6f-9a8b-7c6d5e4f3a21 | vlan6   |                                                       |
+--------------------------------------+---------+-------------------------------------------------------+
";

    #[test]
    fn test_rows_skip_borders_and_header() {
        let rows = rows(NET_LIST);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][1], "vlan6");
        assert_eq!(rows[2][2], "");
    }

    #[test]
    fn test_find_id_matches_whole_cells() {
        assert_eq!(
            find_id(NET_LIST, "vlan208").as_deref(),
            Some("0f8e2c54-8f2c-4c41-9a2f-3b1f0b8b2a01")
        );
        assert_eq!(
            find_id(NET_LIST, "vlan6").as_deref(),
            Some("c2a1f3e4-0b5d-4e6f-9a8b-7c6d5e4f3a21")
        );
        assert!(find_id(NET_LIST, "vlan20").is_none());
    }

    #[test]
    fn test_ids_and_contains_name() {
        assert_eq!(ids(NET_LIST).len(), 3);
        assert!(contains_name(NET_LIST, "vlan2080"));
        assert!(!contains_name(NET_LIST, "name"));
        assert!(ids("").is_empty());
    }
}

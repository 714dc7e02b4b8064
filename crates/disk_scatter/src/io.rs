//! Loader for the whitespace-delimited example pattern format.
//!
//! ```text
//! <class_count>
//! <class_id_0> .. <class_id_{n-1}>
//! <class_id> <x> <y> <r>        one disk per record
//! ```
//!
//! Coordinates and radii are stored scaled by 10000 and divided back on
//! load, producing unit-domain floats. External class ids are mapped to
//! dense indices in declaration order.
use std::collections::HashMap;
use std::io::Read;

use crate::error::{Error, Result};
use crate::geometry::Disk;

const COORDINATE_SCALE: f32 = 10000.0;

pub(crate) fn parse_example(mut reader: impl Read) -> Result<Vec<Vec<Disk>>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let mut tokens = text.split_whitespace();

    let n_classes: usize = tokens
        .next()
        .ok_or_else(|| Error::ParseExample("missing class count".into()))?
        .parse()
        .map_err(|_| Error::ParseExample("invalid class count".into()))?;

    let mut id_map: HashMap<u64, usize> = HashMap::with_capacity(n_classes);
    for index in 0..n_classes {
        let external: u64 = tokens
            .next()
            .ok_or_else(|| Error::ParseExample(format!("missing class id {index}")))?
            .parse()
            .map_err(|_| Error::ParseExample(format!("invalid class id {index}")))?;
        id_map.insert(external, index);
    }

    let mut classes: Vec<Vec<Disk>> = vec![Vec::new(); n_classes];
    while let Some(id_token) = tokens.next() {
        let external: u64 = id_token
            .parse()
            .map_err(|_| Error::ParseExample(format!("invalid disk class id '{id_token}'")))?;
        let index = *id_map
            .get(&external)
            .ok_or_else(|| Error::ParseExample(format!("undeclared class id {external}")))?;
        let mut coords = [0.0f32; 3];
        for value in &mut coords {
            *value = tokens
                .next()
                .ok_or_else(|| Error::ParseExample("truncated disk record".into()))?
                .parse()
                .map_err(|_| Error::ParseExample("invalid disk coordinate".into()))?;
        }
        classes[index].push(Disk::new(
            coords[0] / COORDINATE_SCALE,
            coords[1] / COORDINATE_SCALE,
            coords[2] / COORDINATE_SCALE,
        ));
    }

    Ok(classes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_class_example() {
        let text = "2\n0\n1\n0 1000 1000 200\n1 5000 5000 300\n";
        let classes = parse_example(text.as_bytes()).expect("valid example");
        assert_eq!(classes.len(), 2);
        assert_eq!(classes[0], vec![Disk::new(0.1, 0.1, 0.02)]);
        assert_eq!(classes[1], vec![Disk::new(0.5, 0.5, 0.03)]);
    }

    #[test]
    fn maps_external_ids_to_dense_indices() {
        let text = "2\n7\n3\n3 1000 2000 100\n7 4000 4000 100\n";
        let classes = parse_example(text.as_bytes()).expect("valid example");
        // Declaration order wins: 7 -> 0, 3 -> 1.
        assert_eq!(classes[0], vec![Disk::new(0.4, 0.4, 0.01)]);
        assert_eq!(classes[1], vec![Disk::new(0.1, 0.2, 0.01)]);
    }

    #[test]
    fn rejects_undeclared_class_id() {
        let text = "1\n0\n9 1000 1000 100\n";
        let err = parse_example(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ParseExample(_)));
    }

    #[test]
    fn rejects_truncated_record() {
        let text = "1\n0\n0 1000 1000\n";
        let err = parse_example(text.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ParseExample(_)));
    }

    #[test]
    fn rejects_missing_class_count() {
        let err = parse_example("".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::ParseExample(_)));
    }
}

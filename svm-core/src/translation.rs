use crate::error::{open_input, VolumeError};
use crate::reach::{mb_region, MbReachId, SwordReachId};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;

/// Number of MERIT-Basins slots per SWORD reach in the MERIT-SWORD product.
pub const MAX_TRANSLATION_SLOTS: usize = 40;

/// Column holding the SWORD reach id.
pub const REACH_ID_COLUMN: &str = "reach_id";

/// One (MERIT-Basins reach, overlap length) pair of a SWORD reach.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TranslationSlot {
    pub mb_reach_id: MbReachId,
    /// Length of the SWORD reach lying on this MB reach, in meters.
    pub overlap_length_m: f64,
}

/// All translation slots of one SWORD reach, padded slots included.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRow {
    pub sword_reach_id: SwordReachId,
    pub slots: Vec<TranslationSlot>,
}

impl TranslationRow {
    /// False when the first slot holds the "no translation" sentinel.
    ///
    /// Only the first slot is checked: a row whose first slot is the
    /// sentinel is dropped even if later slots hold ids.
    pub fn has_translation(&self) -> bool {
        self.slots.first().is_some_and(|s| s.mb_reach_id != 0)
    }

    /// Slots in order up to the first non-positive MB id.
    pub fn valid_slots(&self) -> impl Iterator<Item = &TranslationSlot> {
        self.slots.iter().take_while(|s| s.mb_reach_id > 0)
    }
}

/// SWORD to MERIT-Basins translation table, keyed by SWORD reach id.
///
/// Expected CSV columns: `reach_id, mb_1..mb_N, len_1..len_N`. Empty cells
/// are read as the zero sentinel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationTable {
    rows: BTreeMap<SwordReachId, TranslationRow>,
}

fn parse_id(column: &str, value: &str) -> Result<i64, VolumeError> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("nan") {
        return Ok(0);
    }
    if let Ok(i) = v.parse::<i64>() {
        return Ok(i);
    }
    // ids exported from NetCDF come through as floats
    v.parse::<f64>()
        .map(|f| f as i64)
        .map_err(|_| VolumeError::malformed(column, v))
}

fn parse_length(column: &str, value: &str) -> Result<f64, VolumeError> {
    let v = value.trim();
    if v.is_empty() || v.eq_ignore_ascii_case("nan") {
        return Ok(0.0);
    }
    v.parse::<f64>().map_err(|_| VolumeError::malformed(column, v))
}

fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

impl TranslationTable {
    /// Parse a translation CSV string.
    pub fn parse_translation_csv(csv_object: &str) -> Result<Self, VolumeError> {
        Self::from_reader(csv_object.as_bytes())
    }

    /// Read a translation CSV file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, VolumeError> {
        let file = open_input(path.as_ref())?;
        Self::from_reader(file)
    }

    fn from_reader<R: Read>(reader: R) -> Result<Self, VolumeError> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);
        let headers = rdr.headers()?.clone();
        let id_index = column_index(&headers, REACH_ID_COLUMN)
            .ok_or_else(|| VolumeError::MissingColumn(REACH_ID_COLUMN.to_string()))?;
        let mut slot_columns = Vec::new();
        for n in 1..=MAX_TRANSLATION_SLOTS {
            let mb_name = format!("mb_{n}");
            let len_name = format!("len_{n}");
            match (column_index(&headers, &mb_name), column_index(&headers, &len_name)) {
                (Some(mb), Some(len)) => slot_columns.push((mb, len, mb_name, len_name)),
                (None, None) => break,
                (None, Some(_)) => return Err(VolumeError::MissingColumn(mb_name)),
                (Some(_), None) => return Err(VolumeError::MissingColumn(len_name)),
            }
        }
        if slot_columns.is_empty() {
            return Err(VolumeError::MissingColumn("mb_1".to_string()));
        }

        let mut rows = BTreeMap::new();
        for record in rdr.records() {
            let record = record?;
            let sword_reach_id = parse_id(REACH_ID_COLUMN, record.get(id_index).unwrap_or(""))?;
            let slots = slot_columns
                .iter()
                .map(|(mb, len, mb_name, len_name)| {
                    Ok(TranslationSlot {
                        mb_reach_id: parse_id(mb_name, record.get(*mb).unwrap_or(""))?,
                        overlap_length_m: parse_length(len_name, record.get(*len).unwrap_or(""))?,
                    })
                })
                .collect::<Result<Vec<_>, VolumeError>>()?;
            rows.insert(
                sword_reach_id,
                TranslationRow {
                    sword_reach_id,
                    slots,
                },
            );
        }
        debug!("Read {} translation rows with {} slots", rows.len(), slot_columns.len());
        Ok(TranslationTable { rows })
    }

    pub fn from_rows<I: IntoIterator<Item = TranslationRow>>(rows: I) -> Self {
        TranslationTable {
            rows: rows.into_iter().map(|r| (r.sword_reach_id, r)).collect(),
        }
    }

    pub fn get(&self, sword_reach_id: SwordReachId) -> Option<&TranslationRow> {
        self.rows.get(&sword_reach_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows in ascending SWORD reach id order.
    pub fn rows(&self) -> impl Iterator<Item = &TranslationRow> {
        self.rows.values()
    }

    /// Subset of rows whose SWORD reach is in `reach_ids`.
    pub fn restrict_to(&self, reach_ids: &HashSet<SwordReachId>) -> TranslationTable {
        TranslationTable {
            rows: self
                .rows
                .iter()
                .filter(|(id, _)| reach_ids.contains(id))
                .map(|(id, row)| (*id, row.clone()))
                .collect(),
        }
    }

    /// Positive pfaf regions referenced by any slot, ascending.
    pub fn regions(&self) -> BTreeSet<i64> {
        self.rows
            .values()
            .flat_map(|row| row.slots.iter())
            .filter(|slot| slot.mb_reach_id > 0)
            .map(|slot| mb_region(slot.mb_reach_id))
            .filter(|region| *region > 0)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSLATION_CSV: &str = "\
reach_id,mb_1,mb_2,mb_3,len_1,len_2,len_3
74230000011,74012345,74012346,0,1200.5,300.0,0
74230000021,0,0,0,0,0,0
74230000031,74012345.0,-9999,11000001,500,0,80
";

    #[test]
    fn test_parse_translation_csv() {
        let table = TranslationTable::parse_translation_csv(TRANSLATION_CSV).unwrap();
        assert_eq!(table.len(), 3);
        let row = table.get(74230000011).unwrap();
        assert_eq!(row.slots.len(), 3);
        assert!(row.has_translation());
        let valid: Vec<_> = row.valid_slots().collect();
        assert_eq!(valid.len(), 2);
        assert_eq!(valid[0].mb_reach_id, 74012345);
        assert!((valid[0].overlap_length_m - 1200.5).abs() < f64::EPSILON);
        assert!(!table.get(74230000021).unwrap().has_translation());
    }

    #[test]
    fn test_valid_slots_stop_at_sentinel() {
        let table = TranslationTable::parse_translation_csv(TRANSLATION_CSV).unwrap();
        let row = table.get(74230000031).unwrap();
        let valid: Vec<_> = row.valid_slots().map(|s| s.mb_reach_id).collect();
        assert_eq!(valid, vec![74012345]);
    }

    #[test]
    fn test_regions_include_slots_past_sentinel() {
        let table = TranslationTable::parse_translation_csv(TRANSLATION_CSV).unwrap();
        let regions: Vec<i64> = table.regions().into_iter().collect();
        assert_eq!(regions, vec![11, 74]);
    }

    #[test]
    fn test_restrict_to() {
        let table = TranslationTable::parse_translation_csv(TRANSLATION_CSV).unwrap();
        let keep = HashSet::from([74230000011, 99]);
        let subset = table.restrict_to(&keep);
        assert_eq!(subset.len(), 1);
        assert!(subset.get(74230000011).is_some());
    }

    #[test]
    fn test_missing_length_column() {
        let csv = "reach_id,mb_1\n1,2\n";
        let err = TranslationTable::parse_translation_csv(csv).unwrap_err();
        assert!(matches!(err, VolumeError::MissingColumn(c) if c == "len_1"));
    }
}

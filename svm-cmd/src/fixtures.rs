//! Input files of a small region 74 for command tests.

use crate::load::TranslationInputs;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use svm_data::translation::LENGTH_SCALE;
use tempfile::TempDir;

pub(crate) const ANOMALY_CSV: &str = "\
reach_id,2023-10,2023-11,2023-12
74230000011,1.0,2.0,
74230000021,0.5,,3.0
74230000031,4.0,4.0,
";

const TRANSLATION_CSV: &str = "\
reach_id,mb_1,mb_2,len_1,len_2
74230000011,74000001,74000002,1000,500
74230000021,74000002,0,1000,0
74230000031,0,0,0,0
74230000016,74000003,0,100,0
";

const MB_LENGTH_CSV: &str = "\
COMID,lengthkm
74000001,2.0
74000002,4.0
74000003,1.0
";

const SWORD_LENGTH_CSV: &str = "\
reach_id,reach_len
74230000011,1000
74230000021,1000
74230000031,500
74230000016,100
";

pub(crate) struct Fixture {
    pub dir: TempDir,
    pub anomaly_csv: PathBuf,
    pub inputs: TranslationInputs,
}

impl Fixture {
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

/// Two years of monthly volumes from January 2000: `factor * (5e9 + 1e9 * t)`
/// for every MB reach, factor 1, 2 and 3 for low, nrm and hig.
fn cube_csv(factor: f64) -> String {
    let mut csv = String::from("rivid");
    for t in 0..24 {
        let _ = write!(csv, ",{}-{:02}-01", 2000 + t / 12, t % 12 + 1);
    }
    csv.push('\n');
    for reach in [74000001, 74000002, 74000003] {
        csv.push_str(&reach.to_string());
        for t in 0..24 {
            let _ = write!(csv, ",{}", factor * (5e9 + 1e9 * t as f64));
        }
        csv.push('\n');
    }
    csv
}

fn mkdir(root: &Path, name: &str) -> PathBuf {
    let dir = root.join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub(crate) fn region_74() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let anomaly_csv = root.join("V_anom_pfaf_74.csv");
    std::fs::write(&anomaly_csv, ANOMALY_CSV).unwrap();
    let translation_csv = root.join("ms_pfaf_74_translate.csv");
    std::fs::write(&translation_csv, TRANSLATION_CSV).unwrap();

    let mb_dir = mkdir(root, "mb");
    std::fs::write(mb_dir.join("riv_pfaf_74_MERIT_Hydro_v07_Basins_v01.csv"), MB_LENGTH_CSV).unwrap();
    let sword_dir = mkdir(root, "sword");
    std::fs::write(sword_dir.join("as_sword_reaches_hb74_v16.csv"), SWORD_LENGTH_CSV).unwrap();
    let cube_dir = mkdir(root, "cube");
    for (scenario, factor) in [("low", 1.0), ("nrm", 2.0), ("hig", 3.0)] {
        std::fs::write(cube_dir.join(format!("V_pfaf_74_{scenario}.csv")), cube_csv(factor)).unwrap();
    }

    Fixture {
        inputs: TranslationInputs {
            translation_csv,
            mb_dir,
            cube_dir,
            sword_dir,
            length_scale: LENGTH_SCALE,
        },
        anomaly_csv,
        dir,
    }
}

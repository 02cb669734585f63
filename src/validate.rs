use std::path::Path;

use anyhow::bail;

/// Validates the layout of a world export directory: DEM, meta.json,
/// preview.png, the geojson tree and the 4x4 satellite mosaic.
pub fn map_directory(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        bail!("{} does not exist or is no directory", dir.display());
    }

    for file in ["dem.asc.gz", "preview.png", "meta.json"] {
        let path = dir.join(file);
        if !path.is_file() {
            bail!("{} is missing", path.display());
        }
    }

    let geojson_dir = dir.join("geojson");
    if !geojson_dir.is_dir() {
        bail!("{} is missing", geojson_dir.display());
    }

    sat_directory(&dir.join("sat"))
}

/// Validates the satellite mosaic directory: `sat/<col>/<row>.png` for a 4x4
/// grid.
pub fn sat_directory(dir: &Path) -> anyhow::Result<()> {
    if !dir.is_dir() {
        bail!("{} does not exist or is no directory", dir.display());
    }

    for col in 0..4 {
        for row in 0..4 {
            let path = dir.join(col.to_string()).join(format!("{}.png", row));
            if !path.is_file() {
                bail!("{} is missing", path.display());
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{map_directory, sat_directory};
    use std::fs;
    use tempdir::TempDir;

    fn scaffold(dir: &std::path::Path) {
        for file in ["dem.asc.gz", "preview.png", "meta.json"] {
            fs::write(dir.join(file), b"x").unwrap();
        }
        fs::create_dir(dir.join("geojson")).unwrap();
        for col in 0..4 {
            let col_dir = dir.join("sat").join(col.to_string());
            fs::create_dir_all(&col_dir).unwrap();
            for row in 0..4 {
                fs::write(col_dir.join(format!("{}.png", row)), b"x").unwrap();
            }
        }
    }

    #[test]
    fn accepts_a_complete_directory() {
        let dir = TempDir::new("terratile-validate").unwrap();
        scaffold(dir.path());

        assert!(map_directory(dir.path()).is_ok());
    }

    #[test]
    fn rejects_missing_dem() {
        let dir = TempDir::new("terratile-validate").unwrap();
        scaffold(dir.path());
        fs::remove_file(dir.path().join("dem.asc.gz")).unwrap();

        let err = map_directory(dir.path()).unwrap_err();
        assert!(err.to_string().contains("dem.asc.gz"));
    }

    #[test]
    fn rejects_incomplete_sat_mosaic() {
        let dir = TempDir::new("terratile-validate").unwrap();
        scaffold(dir.path());
        fs::remove_file(dir.path().join("sat").join("2").join("3.png")).unwrap();

        assert!(sat_directory(&dir.path().join("sat")).is_err());
        assert!(map_directory(dir.path()).is_err());
    }

    #[test]
    fn rejects_missing_directory() {
        let dir = TempDir::new("terratile-validate").unwrap();

        assert!(map_directory(&dir.path().join("nope")).is_err());
    }
}

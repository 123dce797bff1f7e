use formgrid::cell::FlatMap;
use formgrid::config::GridConfig;
use formgrid::grid::GridModel;
use formgrid::saving::{GridStore, StoreError, is_valid_table_id, load_flat_map, save_flat_map};
use tempfile::tempdir;

#[cfg_attr(test, test)]
fn test_save_and_load_flat_map() {
    println!("\n====== Testing save/load of a flat map ======");
    let dir = tempdir().unwrap();
    let path = dir.path().join("report.bin.gz");

    let mut grid = GridModel::new(2, 2);
    grid.set_cell(0, 0, "<p>Glucose</p>").unwrap();
    grid.set_cell(1, 1, "<strong>5.4</strong> mmol/L").unwrap();
    let flat = grid.to_flat_map();

    save_flat_map(&flat, &path).unwrap();
    assert!(path.exists(), "File was not created");

    let loaded = load_flat_map(&path).unwrap();
    assert_eq!(loaded, flat);
    assert_eq!(GridModel::load_from(&loaded, &GridConfig::default()), grid);
    println!("✓ Flat map survives gzip + bincode");
}

#[cfg_attr(test, test)]
fn test_store_round_trip() {
    println!("\n====== Testing GridStore ======");
    let dir = tempdir().unwrap();
    let store = GridStore::open(dir.path().join("grids")).unwrap();

    let mut flat = FlatMap::new();
    flat.insert("cell-0-0".to_string(), "Name".to_string());
    flat.insert("cell-2-1".to_string(), "X".to_string());

    assert!(!store.exists("lab-42"));
    store.save("lab-42", &flat).unwrap();
    assert!(store.exists("lab-42"));
    assert_eq!(store.load("lab-42").unwrap(), flat);
    println!("✓ Saved grid loads back unchanged");

    flat.insert("cell-0-1".to_string(), "Age".to_string());
    store.save("lab-42", &flat).unwrap();
    assert_eq!(store.load("lab-42").unwrap().len(), 3);
    println!("✓ Saving again replaces the previous snapshot");

    store.delete("lab-42").unwrap();
    assert!(matches!(store.load("lab-42"), Err(StoreError::NotFound(_))));
    assert!(matches!(store.delete("lab-42"), Err(StoreError::NotFound(_))));
    println!("✓ Deleted grids report NotFound");
}

#[cfg_attr(test, test)]
fn test_table_id_validation() {
    assert!(is_valid_table_id("abc_123-X"));
    assert!(!is_valid_table_id(""));
    assert!(!is_valid_table_id("../etc/passwd"));
    assert!(!is_valid_table_id("a b"));
    assert!(!is_valid_table_id(&"x".repeat(65)));

    let dir = tempdir().unwrap();
    let store = GridStore::open(dir.path()).unwrap();
    assert!(matches!(
        store.save("../escape", &FlatMap::new()),
        Err(StoreError::InvalidId(_))
    ));
    assert!(matches!(store.load("a/b"), Err(StoreError::InvalidId(_))));
    println!("✓ Table ids cannot escape the store directory");
}

#[cfg_attr(test, test)]
fn test_corrupt_file() {
    let dir = tempdir().unwrap();
    let store = GridStore::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("bad.bin.gz"), b"not gzip").unwrap();
    assert!(store.load("bad").is_err());
    println!("✓ Corrupt files surface an error instead of panicking");
}

#[cfg_attr(test, test)]
fn test_failed_save_cleans_up() {
    let dir = tempdir().unwrap();
    let store = GridStore::open(dir.path()).unwrap();

    // A directory in place of the target makes the final rename fail
    let target = dir.path().join("blocked.bin.gz");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("occupant"), b"x").unwrap();

    let grid = GridModel::new(2, 2);
    assert!(store.save("blocked", &grid.to_flat_map()).is_err());
    assert!(!dir.path().join("blocked.bin.gz.tmp").exists());
    assert!(target.is_dir());
    println!("✓ A failed save leaves no temporary file behind");
}

fn main() {
    test_save_and_load_flat_map();
    test_store_round_trip();
    test_table_id_validation();
    test_corrupt_file();
    test_failed_save_cleans_up();
    println!("\nAll saving tests passed.");
}

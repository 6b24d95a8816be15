use jstubs_java::list_top_level_packages;
use std::path::PathBuf;

pub fn run(archives: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    for archive in archives {
        for root in list_top_level_packages(archive)? {
            println!("{}\t{}", archive.display(), root);
        }
    }
    Ok(())
}

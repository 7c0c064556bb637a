use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;

use clap::Parser;
use probe_hash::HashTable;
use probe_hash::hash_table::Entry;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Percentage of inserted values to remove again before printing stats.
    #[arg(short = 'r', long = "remove_percent", default_value_t = 0)]
    remove_percent: u64,
}

fn hash_u64(value: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn main() {
    let args = Args::parse();

    println!(
        "Creating HashTable with target capacity: {}",
        args.target_capacity
    );

    let mut table: HashTable<u64> = HashTable::with_capacity(args.target_capacity);

    println!(
        "Actual capacity: {} ({} slots)",
        table.capacity(),
        table.slot_count()
    );
    println!("Filling table with u64 values...");

    let num_values = table.capacity() as u64;
    for value in 0..num_values {
        let hash = hash_u64(value);

        match table.entry(hash, |&v| v == value) {
            Entry::Vacant(entry) => {
                entry.insert(value);
            }
            Entry::Occupied(_) => {
                panic!("Value already exists in table: {}", value);
            }
        }
    }

    println!("Inserted {} values into table", table.len());

    let mut num_removed = 0;
    for value in 0..num_values {
        if value % 100 < args.remove_percent.min(100) {
            table
                .remove(hash_u64(value), |&v| v == value)
                .expect("inserted value is missing");
            num_removed += 1;
        }
    }
    if num_removed > 0 {
        println!(
            "Removed {} values, leaving {} tombstones",
            num_removed,
            table.tombstones()
        );
    }

    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.slot_count() as f64) * 100.0
    );

    table.probe_histogram().print();
    table.debug_stats().print();
}

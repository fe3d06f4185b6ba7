use mappedtable::{MappedHashTable, StrF64Table, TableError, TableParams};

fn main() -> Result<(), TableError> {
    println!("=== MappedHashTable Demo ===\n");

    let dir = std::env::temp_dir().join(format!("mappedtable_demo_{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    // Example 1: raw fixed-width bytes in an anonymous map
    demo_anonymous()?;

    // Example 2: string keys and double values persisted to a file
    demo_persisted(&dir)?;

    // Example 3: what running out of items or buckets looks like
    demo_limits()?;

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}

fn demo_anonymous() -> Result<(), TableError> {
    println!("1. Anonymous table, 8-byte keys and values:");
    let params = TableParams::new(8, 8, 1000).with_nbuckets(2000);
    let mut table: MappedHashTable = MappedHashTable::anonymous(params)?;

    table.insert(b"AAAAAAAA", &0x0102030405060708u64.to_be_bytes())?;
    println!("   get(AAAAAAAA) = {:?}", table.get(b"AAAAAAAA"));
    println!("   get(BBBBBBBB) = {:?}", table.get(b"BBBBBBBB"));
    println!("   {table:?}, load factor {:.4}", table.load_factor());
    table.close()?;
    println!();
    Ok(())
}

fn demo_persisted(dir: &std::path::Path) -> Result<(), TableError> {
    println!("2. File-backed table with string keys and f64 pairs:");
    let path = dir.join("points.ht");
    let params = TableParams::new(24, 2 * std::mem::size_of::<f64>(), 10000).with_nbuckets(20000);

    let mut table: StrF64Table = StrF64Table::create(params, Some(path.as_path()))?;
    for (name, point) in [
        ("5d5d4f5f5e06cd00d5a5d03b", [2.4928040606765896, 2213.2489533122025]),
        ("origin", [0.0, 0.0]),
        ("unit", [1.0, 1.0]),
    ] {
        table.insert(name, &point)?;
        println!("   Stored {name} -> {point:?}");
    }
    table.close()?;
    println!("   Closed; file is {} bytes", std::fs::metadata(&path)?.len());

    let table: StrF64Table = StrF64Table::open(&path)?;
    for name in ["origin", "5d5d4f5f5e06cd00d5a5d03b", "missing"] {
        println!("   Reopened get({name}) = {:?}", table.get(name)?);
    }
    match table.get("a key that is far too long for the table") {
        Err(e) => println!("   Overlong key: {e}"),
        Ok(v) => println!("   Unexpected: {v:?}"),
    }
    table.close()?;
    println!();
    Ok(())
}

fn demo_limits() -> Result<(), TableError> {
    println!("3. Capacity and bucket limits:");
    let mut full: MappedHashTable = MappedHashTable::anonymous(TableParams::new(1, 1, 2))?;
    full.insert(b"a", b"1")?;
    full.insert(b"b", b"2")?;
    println!("   third insert into capacity 2: {:?}", full.insert(b"c", b"3"));

    let params = TableParams::new(2, 1, 4).with_nbuckets(1);
    let mut crowded: MappedHashTable = MappedHashTable::anonymous(params)?;
    crowded.insert(b"Aa", b"1")?;
    println!("   second insert into 1 bucket: {:?}", crowded.insert(b"BB", b"2"));
    Ok(())
}

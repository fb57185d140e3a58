use chain_map::Builder;
use chain_map::HashMap;
use clap::Parser;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    /// Fixed hash seed, random when omitted
    #[arg(short = 's', long = "seed")]
    seed: Option<u32>,

    /// Remove this many entries after filling to exercise shrinking
    #[arg(short = 'r', long = "remove", default_value_t = 0)]
    remove: usize,
}

fn main() -> chain_map::Result<()> {
    let args = Args::parse();

    println!(
        "Creating HashMap with target capacity: {}",
        args.target_capacity
    );

    let mut builder = Builder::new().capacity(args.target_capacity);
    if let Some(seed) = args.seed {
        builder = builder.seed(seed);
    }
    let mut map: HashMap<u64, u64> = builder.build();

    println!("Actual capacity: {}", map.capacity());
    println!("Seed: {:#010x}", map.seed());
    println!("Filling map with u64 keys...");

    let num_values = args.target_capacity.max(1);
    let mut growths = 0;
    for i in 0..num_values {
        let before = map.capacity();
        map.insert(i as u64, i as u64 * 2)?;
        if map.capacity() != before {
            growths += 1;
        }
    }

    println!("Inserted {} values into map ({} growths)", map.len(), growths);

    let mut shrinks = 0;
    for i in 0..args.remove.min(num_values) {
        let before = map.capacity();
        map.remove(&(i as u64))?;
        if map.capacity() != before {
            shrinks += 1;
        }
    }
    if args.remove > 0 {
        println!("Removed down to {} values ({} shrinks)", map.len(), shrinks);
    }

    map.chain_length_histogram().print();
    map.stats().print();

    Ok(())
}

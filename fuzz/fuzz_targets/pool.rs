#![no_main]
use arbitrary::{Arbitrary, Unstructured};
use libfuzzer_sys::fuzz_target;
use std::collections::HashMap;
use upool::{Config, Offset};

#[derive(Arbitrary, Clone, Debug)]
enum Op {
    Insert(Vec<u8>),
    Lookup(Vec<u8>),
}

fuzz_target!(|data: &[u8]| {
    let mut unstructured = Unstructured::new(data);

    let initial_capacity = u8::arbitrary(&mut unstructured).unwrap_or_default();
    let max_load_factor = (f32::from(u8::arbitrary(&mut unstructured).unwrap_or(u8::MAX)) / 255.0)
        .max(0.05)
        .min(1.0);

    let Ok(ops) = <Vec<Op> as Arbitrary>::arbitrary(&mut unstructured) else {
        return;
    };

    let mut pool = Config::new()
        .initial_capacity(initial_capacity.into())
        .max_load_factor(max_load_factor)
        .build()
        .unwrap();

    let mut model = HashMap::<Vec<u8>, Offset>::new();

    for op in ops {
        match op {
            Op::Insert(blob) => {
                let item = pool.insert(&blob).unwrap();

                match model.get(&blob) {
                    Some(offset) => {
                        assert_eq!(*offset, item.offset);
                        assert!(!item.is_new);
                    }
                    None => {
                        assert!(item.is_new);
                        assert_eq!(Some(&blob[..]), pool.get(item.offset, blob.len() as u32));
                        model.insert(blob, item.offset);
                    }
                }
            }
            Op::Lookup(blob) => {
                assert_eq!(model.get(&blob).copied(), pool.lookup(&blob));
            }
        }
    }

    assert_eq!(model.len(), pool.len());
    assert_eq!(model.len(), pool.iter().count());
    assert!(pool.capacity() == 0 || pool.capacity().is_power_of_two());
});

// SPDX-License-Identifier: MPL-2.0
// SPDX-FileCopyrightText: Copyright 2025 The Bedrock Developers

//! Evaluate bump pools over static, inline, and external storage.

use bedrock::bump_pool::{
    self, AlignedPoolStorage, BumpPool, BumpPoolOptions, CreateError, StaticPoolStorage,
};

fn test_bump_pool(pool: &BumpPool<'_>) {
    let capacity = pool.capacity();
    assert_eq!(pool.used(), 0);
    assert_eq!(pool.remaining(), capacity);

    // The n-th allocation starts exactly at the sum of all previous
    // sizes.
    let sizes = [1usize, 7, 16, 3, 32];
    let mut expected_offset = 0;
    let base = pool.allocate(0).unwrap().as_ptr() as usize;
    for size in sizes {
        let region = pool.allocate(size).unwrap();
        assert_eq!(region.as_ptr() as usize, base + expected_offset);
        assert_eq!(region.len(), size);
        expected_offset += size;
    }
    assert_eq!(pool.used(), expected_offset);
    assert_eq!(pool.remaining(), capacity - expected_offset);

    // Overflowing requests fail without consuming anything.
    let used = pool.used();
    assert!(pool.allocate(pool.remaining() + 1).is_none());
    assert_eq!(pool.used(), used);

    // Release is a guaranteed no-op.
    let region = pool.allocate(8).unwrap();
    let used = pool.used();
    bump_pool::release(region);
    assert_eq!(pool.used(), used);

    // Regions are writable through their full span.
    let mut region = pool.allocate(16).unwrap();
    region.fill(0x5A);
    assert!(region.iter().all(|&byte| byte == 0x5A));
}

#[test]
fn static_storage() {
    static STORAGE: StaticPoolStorage<512> = StaticPoolStorage::new();

    let storage = STORAGE.take().unwrap();
    assert!(STORAGE.take().is_none());

    let pool = BumpPool::create(storage, &Default::default()).unwrap();
    test_bump_pool(&pool);
}

#[test]
fn local_storage() {
    let mut storage = AlignedPoolStorage::from_array([0u8; 512]);
    let pool = BumpPool::create(&mut storage, &Default::default()).unwrap();
    test_bump_pool(&pool);
}

#[test]
fn storage_elsewhere() {
    let mut storage = AlignedPoolStorage::from_array([0u8; 512]);
    fn create_and_test_pool(storage: &mut [u8]) {
        let pool = BumpPool::create(storage, &Default::default()).unwrap();
        test_bump_pool(&pool);
    }
    create_and_test_pool(storage.get_mut());
}

#[test]
fn exhaustion_scenario() {
    // Pool of 24 bytes; allocations of 10, 10, 10. The first two land
    // at offsets 0 and 10; the third needs bytes 20..30 with only 4
    // remaining, so it fails and the cursor stays at 20.
    let mut storage = [0u8; 24];
    let pool = BumpPool::create(&mut storage, &Default::default()).unwrap();

    let first = pool.allocate(10).unwrap();
    let second = pool.allocate(10).unwrap();
    assert_eq!(
        second.as_ptr() as usize - first.as_ptr() as usize,
        10,
    );

    assert!(pool.allocate(10).is_none());
    assert_eq!(pool.used(), 20);
    assert_eq!(pool.remaining(), 4);
}

#[test]
fn empty_storage_is_rejected() {
    let mut storage = [0u8; 0];
    let result = BumpPool::create(&mut storage, &Default::default());
    assert!(matches!(result, Err(CreateError::InvalidSize)));
}

#[test]
fn pool_info_reports_usage() {
    let mut storage = [0u8; 64];
    let pool = BumpPool::create(&mut storage, &{
        let mut opts = BumpPoolOptions::default();
        opts.name = Some("scratch");
        opts
    })
    .unwrap();

    let _ = pool.allocate(24).unwrap();

    let info = pool.info();
    assert_eq!(info.name, Some("scratch"));
    assert_eq!(info.capacity, 64);
    assert_eq!(info.used, 24);
    assert_eq!(info.remaining, 40);
}

#[test]
fn fresh_pool_resets_the_cursor() {
    let mut storage = [0u8; 32];

    {
        let pool = BumpPool::create(&mut storage, &Default::default()).unwrap();
        let _ = pool.allocate(32).unwrap();
        assert_eq!(pool.remaining(), 0);
    }

    // Re-creating the pool over the same storage restarts allocation
    // from offset zero; the old regions are statically gone.
    let pool = BumpPool::create(&mut storage, &Default::default()).unwrap();
    assert_eq!(pool.used(), 0);
    assert!(pool.allocate(32).is_some());
}

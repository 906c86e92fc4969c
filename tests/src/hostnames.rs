use hostmap::{
    hash_key_lc, hash_strlow, BuildOptions, HashError, HostKeys, HostMap, KeyFlags, StagingSize,
};

fn wildcard() -> KeyFlags {
    KeyFlags {
        wildcard_keys: true,
        ..KeyFlags::default()
    }
}

fn build_map(entries: &[(&str, usize)], opts: &BuildOptions) -> HostMap<usize> {
    let mut keys = HostKeys::new(StagingSize::Small);
    for (name, value) in entries {
        let mut buf = name.as_bytes().to_vec();
        keys.add_key(&mut buf, *value, wildcard()).unwrap();
    }
    HostMap::build(keys, opts).unwrap()
}

#[test]
fn exact_keys_resolve_case_insensitively() {
    let opts = BuildOptions {
        max_size: 7,
        bucket_size: 64,
        ..BuildOptions::default()
    };
    let map = build_map(&[("Example.COM", 0x1), ("www.example.com", 0x2)], &opts);

    assert_eq!(
        map.find_with_hash(hash_key_lc(b"example.com"), b"example.com"),
        Some(&0x1)
    );

    let mut lowered = [0u8; 15];
    let key = hash_strlow(&mut lowered, b"WWW.example.com");
    assert_eq!(map.find_with_hash(key, &lowered), Some(&0x2));

    assert_eq!(map.find(b"example.org"), None);
}

#[test]
fn every_case_permutation_resolves() {
    let map = build_map(&[("Example.COM", 7)], &BuildOptions::default());

    for query in &["example.com", "EXAMPLE.COM", "eXaMpLe.CoM", "EXAMPLE.com"] {
        let mut lowered = vec![0u8; query.len()];
        let key = hash_strlow(&mut lowered, query.as_bytes());
        assert_eq!(map.find_with_hash(key, &lowered), Some(&7), "{}", query);
    }
}

#[test]
fn dot_prefix_matches_literal_and_subdomains() {
    let map = build_map(&[(".example.com", 0xA)], &BuildOptions::default());

    assert_eq!(map.find(b"example.com"), Some(&0xA));
    assert_eq!(map.find(b"a.example.com"), Some(&0xA));
    assert_eq!(map.find(b"deep.a.example.com"), Some(&0xA));
    assert_eq!(map.find(b"example.org"), None);
}

#[test]
fn star_prefix_matches_subdomains_only() {
    let map = build_map(&[("*.example.com", 0xB)], &BuildOptions::default());

    assert_eq!(map.find(b"example.com"), None);
    assert_eq!(map.find(b"a.example.com"), Some(&0xB));
    assert_eq!(map.find(b"deep.a.example.com"), Some(&0xB));
}

#[test]
fn tail_wildcard_matches_any_suffix() {
    let map = build_map(&[("www.example.*", 0xC)], &BuildOptions::default());

    assert_eq!(map.find(b"www.example.com"), Some(&0xC));
    assert_eq!(map.find(b"www.example.co.uk"), Some(&0xC));
    assert_eq!(map.find(b"www.example"), None);
    assert_eq!(map.find(b"mail.example.com"), None);
}

#[test]
fn deep_hierarchies() {
    let map = build_map(&[("*.a.b.c", 1), (".x.y.z", 2), ("w.e.*", 3)], &BuildOptions::default());

    assert_eq!(map.find(b"q.a.b.c"), Some(&1));
    assert_eq!(map.find(b"deep.q.a.b.c"), Some(&1));
    assert_eq!(map.find(b"a.b.c"), None);

    assert_eq!(map.find(b"x.y.z"), Some(&2));
    assert_eq!(map.find(b"q.x.y.z"), Some(&2));

    assert_eq!(map.find(b"w.e.com"), Some(&3));
    assert_eq!(map.find(b"w.e.co.uk"), Some(&3));
    assert_eq!(map.find(b"w.e"), None);
}

#[test]
fn nested_star_under_dot_prefix() {
    let map = build_map(
        &[(".example.com", 1), ("*.www.example.com", 2)],
        &BuildOptions::default(),
    );

    assert_eq!(map.find(b"example.com"), Some(&1));
    assert_eq!(map.find(b"x.example.com"), Some(&1));
    assert_eq!(map.find(b"www.example.com"), Some(&1));
    assert_eq!(map.find(b"a.www.example.com"), Some(&2));
}

#[test]
fn exact_beats_head_beats_tail() {
    let map = build_map(
        &[("www.example.com", 1), (".example.com", 2), ("www.example.*", 3)],
        &BuildOptions::default(),
    );

    // all three cover "www.example.com"; the exact entry wins
    assert_eq!(map.find(b"www.example.com"), Some(&1));
    // head and tail both cover "a.example.com"... only head here
    assert_eq!(map.find(b"a.example.com"), Some(&2));
    // only the tail pattern covers a foreign suffix
    assert_eq!(map.find(b"www.example.net"), Some(&3));
}

#[test]
fn head_wildcard_beats_tail_wildcard() {
    let map = build_map(&[(".example.net", 2), ("www.example.*", 3)], &BuildOptions::default());

    // both patterns cover "www.example.net"; the head result wins
    assert_eq!(map.find(b"www.example.net"), Some(&2));
    assert_eq!(map.find(b"www.example.org"), Some(&3));
}

#[test]
fn per_table_entry_points() {
    let map = build_map(
        &[("exact.example.com", 1), ("*.example.com", 2), ("www.example.*", 3)],
        &BuildOptions::default(),
    );

    let name = b"exact.example.com";
    assert_eq!(map.find_exact(hash_key_lc(name), name), Some(&1));
    assert_eq!(map.find_exact(hash_key_lc(b"a.example.com"), b"a.example.com"), None);

    assert_eq!(map.find_wc_head(b"a.example.com"), Some(&2));
    assert_eq!(map.find_wc_head(b"example.com"), None);

    assert_eq!(map.find_wc_tail(b"www.example.org"), Some(&3));
    assert_eq!(map.find_wc_tail(b"www.example"), None);
}

#[test]
fn conflicting_literal_is_busy() {
    let mut keys = HostKeys::new(StagingSize::Small);

    let mut buf = b"example.com".to_vec();
    keys.add_key(&mut buf, 1usize, wildcard()).unwrap();

    let mut buf = b".example.com".to_vec();
    let err = keys.add_key(&mut buf, 2usize, wildcard()).unwrap_err();
    assert!(matches!(err, HashError::Duplicate(_)));

    // the builder stays usable after a rejected key
    let mut buf = b"other.example.com".to_vec();
    keys.add_key(&mut buf, 3usize, wildcard()).unwrap();

    let map = HostMap::build(keys, &BuildOptions::default()).unwrap();
    assert_eq!(map.find(b"example.com"), Some(&1));
    assert_eq!(map.find(b"other.example.com"), Some(&3));
    assert_eq!(map.len(), 2);
}

#[test]
fn malformed_keys_are_declined() {
    let mut keys = HostKeys::new(StagingSize::Small);

    for bad in &[&b"a..b"[..], b"a*b*c", b"nul\0byte"] {
        let mut buf = bad.to_vec();
        let err = keys.add_key(&mut buf, 0usize, wildcard()).unwrap_err();
        assert!(matches!(err, HashError::Malformed(_)), "{:?}", bad);
    }
}

#[test]
fn element_too_large_for_bucket() {
    let mut keys = HostKeys::new(StagingSize::Small);
    let mut buf = b"quite.a.long.hostname.example.com".to_vec();
    keys.add_key(&mut buf, 1usize, wildcard()).unwrap();

    let opts = BuildOptions {
        max_size: 7,
        bucket_size: 24,
        ..BuildOptions::default()
    };
    assert!(matches!(
        HostMap::build(keys, &opts),
        Err(HashError::ElementSize { .. })
    ));
}

#[test]
fn forced_single_bucket_still_resolves() {
    let mut keys = HostKeys::new(StagingSize::Small);
    for i in 0..6 {
        let mut buf = format!("key{}.example.com", i).into_bytes();
        keys.add_key(&mut buf, i, wildcard()).unwrap();
    }

    // max_size = 1 exhausts the search; the build logs a warning and
    // packs everything into the one bucket anyway
    let opts = BuildOptions {
        max_size: 1,
        bucket_size: 64,
        ..BuildOptions::default()
    };
    let map = HostMap::build(keys, &opts).unwrap();
    for i in 0..6 {
        let name = format!("key{}.example.com", i).into_bytes();
        assert_eq!(map.find(&name), Some(&i));
    }
}

#[test]
fn empty_map_misses_everything() {
    let keys: HostKeys<usize> = HostKeys::new(StagingSize::Small);
    let map = HostMap::build(keys, &BuildOptions::default()).unwrap();

    assert!(map.is_empty());
    assert_eq!(map.find(b"example.com"), None);
    assert_eq!(map.find(b""), None);
}

#[test]
fn lookups_are_repeatable() {
    let map = build_map(
        &[("example.com", 1), ("*.example.org", 2), ("www.static.*", 3)],
        &BuildOptions::default(),
    );

    for _ in 0..3 {
        assert_eq!(map.find(b"example.com"), Some(&1));
        assert_eq!(map.find(b"a.example.org"), Some(&2));
        assert_eq!(map.find(b"www.static.io"), Some(&3));
        assert_eq!(map.find(b"absent.example.net"), None);
    }
}

#[test]
fn generated_corpus_resolves_key_by_key() {
    let mut keys = HostKeys::new(StagingSize::Large);

    for i in 0..300 {
        let mut buf = format!("h{}.d{}.example.com", i, i % 13).into_bytes();
        keys.add_key(&mut buf, i, wildcard()).unwrap();
    }
    for j in 0..20 {
        let mut buf = format!("*.w{}.example.net", j).into_bytes();
        keys.add_key(&mut buf, 1000 + j, wildcard()).unwrap();
    }
    for j in 0..10 {
        let mut buf = format!("t{}.example.*", j).into_bytes();
        keys.add_key(&mut buf, 2000 + j, wildcard()).unwrap();
    }

    let opts = BuildOptions {
        max_size: 2048,
        bucket_size: 128,
        ..BuildOptions::default()
    };
    let map = HostMap::build(keys, &opts).unwrap();
    assert_eq!(map.len(), 330);

    for i in 0..300 {
        let name = format!("h{}.d{}.example.com", i, i % 13).into_bytes();
        assert_eq!(map.find(&name), Some(&i));
    }
    for j in 0..20 {
        let hit = format!("x.w{}.example.net", j).into_bytes();
        assert_eq!(map.find(&hit), Some(&(1000 + j)));
        let bare = format!("w{}.example.net", j).into_bytes();
        assert_eq!(map.find(&bare), None);
    }
    for j in 0..10 {
        let hit = format!("t{}.example.org", j).into_bytes();
        assert_eq!(map.find(&hit), Some(&(2000 + j)));
        let bare = format!("t{}.example", j).into_bytes();
        assert_eq!(map.find(&bare), None);
    }

    assert_eq!(map.find(b"h300.d1.example.com"), None);
    assert_eq!(map.find(b"x.w20.example.net"), None);
}

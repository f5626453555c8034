#[cfg(test)]
mod test {
    use crate::db::db::RedisDb;
    use crate::db::error::ZSetError;
    use crate::db::skiplist::RangeSpec;
    use crate::db::zset::{normalize_rank_range, Aggregate, Limit, ScoredEntry, ZSet};
    use bytes::Bytes;

    fn b(s: &str) -> Bytes {
        Bytes::from(s.to_string())
    }

    fn abc() -> ZSet {
        let mut zset = ZSet::new();
        zset.add(1.0, b("a")).unwrap();
        zset.add(2.0, b("b")).unwrap();
        zset.add(3.0, b("c")).unwrap();
        zset
    }

    fn members(entries: &[ScoredEntry]) -> Vec<String> {
        entries
            .iter()
            .map(|e| String::from_utf8_lossy(&e.member).into_owned())
            .collect()
    }

    fn numbered(n: i64) -> ZSet {
        let mut zset = ZSet::new();
        for i in 0..n {
            zset.add(i as f64, Bytes::from(format!("m{:03}", i))).unwrap();
        }
        zset
    }

    #[test]
    fn zset_add_and_update() {
        let mut zset = ZSet::new();
        assert!(zset.add(1.0, b("a")).unwrap());
        assert!(!zset.add(5.0, b("a")).unwrap());
        assert_eq!(zset.score(b"a"), Some(5.0));
        assert_eq!(zset.len(), 1);
        assert!(zset.add(2.0, b("b")).unwrap());
        assert_eq!(zset.rank(b"b"), Some(0));
        assert_eq!(zset.rank(b"a"), Some(1));
        assert_eq!(zset.rank(b"missing"), None);
        assert_eq!(zset.score(b"missing"), None);
    }

    #[test]
    fn zset_size_tracks_distinct_members() {
        let mut zset = ZSet::new();
        for i in 0..200 {
            zset.add((i % 7) as f64, Bytes::from(format!("m{}", i % 50))).unwrap();
        }
        assert_eq!(zset.len(), 50);
        for i in 0..25 {
            assert!(zset.remove(format!("m{}", i).as_bytes()));
        }
        assert!(!zset.remove(b"m0"));
        assert_eq!(zset.len(), 25);
        assert_eq!(zset.entries().len(), 25);
    }

    #[test]
    fn zset_try_add_keeps_first_score() {
        let mut zset = ZSet::new();
        assert!(zset.try_add(1.0, b("m")).unwrap());
        assert!(!zset.try_add(9.0, b("m")).unwrap());
        assert_eq!(zset.score(b"m"), Some(1.0));
    }

    #[test]
    fn zset_tie_break_on_member_bytes() {
        let mut zset = ZSet::new();
        zset.add(5.0, b("b")).unwrap();
        zset.add(5.0, b("a")).unwrap();
        assert!(zset.rank(b"a") < zset.rank(b"b"));

        let mut other = ZSet::new();
        other.add(5.0, b("a")).unwrap();
        other.add(5.0, b("b")).unwrap();
        assert_eq!(zset.entries(), other.entries());
    }

    #[test]
    fn zset_nan_is_rejected() {
        let mut zset = abc();
        assert!(matches!(zset.add(f64::NAN, b("x")), Err(ZSetError::InvalidArgument(_))));
        assert!(matches!(zset.add_score(b("a"), f64::NAN), Err(ZSetError::InvalidArgument(_))));
        let batch = vec![ScoredEntry::new("x", 1.0), ScoredEntry::new("y", f64::NAN)];
        assert!(zset.add_all(batch).is_err());
        // nothing from the failed batch was written
        assert!(!zset.contains(b"x"));
        assert_eq!(zset.len(), 3);
    }

    #[test]
    fn zset_nan_bound_is_rejected() {
        let mut zset = abc();
        let nan_min = RangeSpec::new(f64::NAN, true, 3.0, true);
        let nan_max = RangeSpec::new(1.0, true, f64::NAN, false);
        assert!(matches!(zset.count(&nan_min), Err(ZSetError::InvalidArgument(_))));
        assert!(matches!(zset.range_by_score(&nan_max, true, None), Err(ZSetError::InvalidArgument(_))));
        assert!(matches!(zset.remove_range_by_score(&nan_min), Err(ZSetError::InvalidArgument(_))));
        assert_eq!(zset.len(), 3);
    }

    #[test]
    fn zset_signed_zero_is_kept() {
        let mut zset = ZSet::new();
        zset.add(0.0, b("z")).unwrap();
        zset.add(1.0, b("a")).unwrap();
        assert!(!zset.add(-0.0, b("z")).unwrap());
        assert_eq!(zset.score(b"z").map(f64::to_bits), Some((-0.0f64).to_bits()));
        let entries = zset.range_by_rank(0, 0, false);
        assert_eq!(entries[0].score.to_bits(), (-0.0f64).to_bits());
        assert_eq!(zset.rank(b"z"), Some(0));
        assert_eq!(zset.rank(b"a"), Some(1));
    }

    #[test]
    fn zset_try_add_all_counts_new_members() {
        let mut zset = abc();
        let batch = vec![ScoredEntry::new("a", 9.0), ScoredEntry::new("d", 4.0), ScoredEntry::new("e", 5.0)];
        assert_eq!(zset.try_add_all(batch), Ok(2));
        assert_eq!(zset.score(b"a"), Some(1.0));
        let batch = vec![ScoredEntry::new("a", 9.0), ScoredEntry::new("f", 6.0)];
        assert_eq!(zset.add_all(batch), Ok(1));
        assert_eq!(zset.score(b"a"), Some(9.0));
    }

    #[test]
    fn zset_add_score() {
        let mut zset = abc();
        assert_eq!(zset.add_score(b("a"), 10.0).unwrap(), 11.0);
        assert_eq!(zset.last(), Some(b("a")));
        assert_eq!(zset.add_score(b("new"), -1.5).unwrap(), -1.5);
        assert_eq!(zset.first(), Some(b("new")));

        zset.add(f64::INFINITY, b("inf")).unwrap();
        assert_eq!(zset.add_score(b("inf"), f64::NEG_INFINITY), Err(ZSetError::NotANumber));
        assert_eq!(zset.score(b"inf"), Some(f64::INFINITY));
    }

    #[test]
    fn zset_add_all_counts_new_members() {
        let mut zset = abc();
        let added = zset
            .add_all(vec![
                ScoredEntry::new("a", 7.0),
                ScoredEntry::new("d", 4.0),
                ScoredEntry::new("e", 5.0),
            ])
            .unwrap();
        assert_eq!(added, 2);
        assert_eq!(zset.score(b"a"), Some(7.0));
        assert_eq!(zset.read_all().len(), 5);
    }

    #[test]
    fn zset_remove_all_and_retain_all() {
        let mut zset = abc();
        assert!(!zset.remove_all(&[b("x"), b("y")]));
        assert!(zset.remove_all(&[b("x"), b("a")]));
        assert_eq!(zset.len(), 2);

        let mut zset = abc();
        assert!(!zset.retain_all(&[b("a"), b("b"), b("c"), b("z")]));
        assert!(zset.retain_all(&[b("b")]));
        assert_eq!(zset.read_all(), vec![b("b")]);
        assert!(zset.contains_all(&[b("b")]));
        assert!(!zset.contains_all(&[b("b"), b("a")]));
    }

    #[test]
    fn zset_rank_scenario() {
        let zset = abc();
        let range = RangeSpec::new(1.0, true, 3.0, false);
        let found = zset.range_by_score(&range, false, None).unwrap();
        assert_eq!(members(&found), vec!["a", "b"]);
        assert_eq!(zset.count(&RangeSpec::new(1.0, true, 3.0, true)), Ok(3));
        assert_eq!(zset.rank(b"c"), Some(2));
        assert_eq!(zset.rev_rank(b"c"), Some(0));
        assert_eq!(zset.rev_rank(b"a"), Some(2));
    }

    #[test]
    fn zset_range_by_rank() {
        let zset = numbered(10);
        let all = zset.range_by_rank(0, -1, false);
        assert_eq!(all.len(), 10);
        let mut reversed = zset.range_by_rank(0, -1, true);
        reversed.reverse();
        assert_eq!(all, reversed);

        let tail = zset.range_by_rank(-3, -1, false);
        assert_eq!(members(&tail), vec!["m007", "m008", "m009"]);
        let top = zset.range_by_rank(0, 1, true);
        assert_eq!(members(&top), vec!["m009", "m008"]);
        assert!(zset.range_by_rank(5, 2, false).is_empty());
        assert!(zset.range_by_rank(10, 20, false).is_empty());
        assert_eq!(zset.range_by_rank(8, 100, false).len(), 2);
        assert!(ZSet::new().range_by_rank(0, -1, false).is_empty());
    }

    #[test]
    fn zset_normalize_rank_range() {
        assert_eq!(normalize_rank_range(0, -1, 5), Some((0, 4)));
        assert_eq!(normalize_rank_range(-100, 2, 5), Some((0, 2)));
        assert_eq!(normalize_rank_range(3, 100, 5), Some((3, 4)));
        assert_eq!(normalize_rank_range(4, 3, 5), None);
        assert_eq!(normalize_rank_range(5, 6, 5), None);
        assert_eq!(normalize_rank_range(0, -1, 0), None);
    }

    #[test]
    fn zset_range_by_score_bounds() {
        let zset = numbered(10);
        let ex = RangeSpec::new(2.0, false, 5.0, false);
        let found = zset.range_by_score(&ex, false, None).unwrap();
        assert_eq!(members(&found), vec!["m003", "m004"]);

        let rev = zset.range_by_score(&RangeSpec::new(2.0, true, 5.0, true), true, None).unwrap();
        assert_eq!(members(&rev), vec!["m005", "m004", "m003", "m002"]);

        // contradictory bounds are an empty result, not an error
        assert!(zset.range_by_score(&RangeSpec::new(5.0, true, 2.0, true), false, None).unwrap().is_empty());
        assert!(zset.range_by_score(&RangeSpec::new(3.0, false, 3.0, true), false, None).unwrap().is_empty());
        assert_eq!(zset.count(&RangeSpec::new(5.0, true, 2.0, true)), Ok(0));
        assert_eq!(zset.count(&RangeSpec::all()), Ok(10));
        assert_eq!(
            zset.count(&RangeSpec::new(f64::NEG_INFINITY, true, 4.0, false)),
            Ok(4)
        );
    }

    #[test]
    fn zset_range_by_score_limit() {
        let zset = numbered(20);
        let all = RangeSpec::all();
        let page = zset.range_by_score(&all, false, Some(Limit::new(5, 3))).unwrap();
        assert_eq!(members(&page), vec!["m005", "m006", "m007"]);

        let page = zset.range_by_score(&all, true, Some(Limit::new(2, 2))).unwrap();
        assert_eq!(members(&page), vec!["m017", "m016"]);

        let range = RangeSpec::new(10.0, true, 14.0, true);
        let page = zset.range_by_score(&range, false, Some(Limit::new(3, -1))).unwrap();
        assert_eq!(members(&page), vec!["m013", "m014"]);
        assert!(zset.range_by_score(&range, false, Some(Limit::new(5, 10))).unwrap().is_empty());
        assert!(zset.range_by_score(&range, false, Some(Limit::new(0, 0))).unwrap().is_empty());

        // paging through yields every entry exactly once
        let mut seen = vec![];
        let mut offset = 0;
        loop {
            let page = zset.range_by_score(&all, false, Some(Limit::new(offset, 6))).unwrap();
            if page.is_empty() {
                break;
            }
            offset += page.len() as i64;
            seen.extend(page);
        }
        assert_eq!(seen, zset.entries());

        assert!(matches!(
            zset.range_by_score(&all, false, Some(Limit::new(-1, 3))),
            Err(ZSetError::InvalidArgument(_))
        ));
        assert!(matches!(
            zset.range_by_score(&all, false, Some(Limit::new(0, -2))),
            Err(ZSetError::InvalidArgument(_))
        ));
    }

    #[test]
    fn zset_remove_ranges() {
        let mut zset = numbered(10);
        assert_eq!(zset.remove_range_by_rank(0, 2), 3);
        assert_eq!(zset.first(), Some(b("m003")));
        assert_eq!(zset.remove_range_by_rank(-2, -1), 2);
        assert_eq!(zset.last(), Some(b("m007")));
        assert_eq!(zset.remove_range_by_rank(4, 2), 0);
        assert_eq!(zset.len(), 5);

        assert_eq!(zset.remove_range_by_score(&RangeSpec::new(4.0, false, 6.0, true)), Ok(2));
        assert_eq!(zset.read_all().len(), 3);
        assert!(zset.contains(b"m004"));
        assert!(!zset.contains(b"m005"));
        assert_eq!(zset.remove_range_by_score(&RangeSpec::new(9.0, true, 1.0, true)), Ok(0));
    }

    #[test]
    fn zset_poll_single_element() {
        let mut zset = ZSet::new();
        zset.add(1.0, b("only")).unwrap();
        assert_eq!(zset.pop_first(), Some(b("only")));
        assert!(zset.is_empty());
        assert_eq!(zset.pop_last(), None);
        assert_eq!(zset.first(), None);
        assert_eq!(zset.last(), None);

        let mut zset = abc();
        assert_eq!(zset.pop_last(), Some(b("c")));
        assert_eq!(zset.pop_first(), Some(b("a")));
        assert_eq!(zset.entries(), vec![ScoredEntry::new("b", 2.0)]);
    }

    #[test]
    fn zset_union_and_intersection() {
        let mut a = ZSet::new();
        a.add(1.0, b("x")).unwrap();
        let mut bset = ZSet::new();
        bset.add(2.0, b("x")).unwrap();
        bset.add(3.0, b("y")).unwrap();

        let inputs = [(Some(&a), 1.0), (Some(&bset), 2.0)];
        let union = ZSet::union(&inputs, Aggregate::Sum);
        assert_eq!(union.entries(), vec![ScoredEntry::new("x", 5.0), ScoredEntry::new("y", 6.0)]);
        let inter = ZSet::intersection(&inputs, Aggregate::Sum);
        assert_eq!(inter.entries(), vec![ScoredEntry::new("x", 5.0)]);

        let min = ZSet::union(&inputs, Aggregate::Min);
        assert_eq!(min.score(b"x"), Some(1.0));
        let max = ZSet::intersection(&inputs, Aggregate::Max);
        assert_eq!(max.score(b"x"), Some(4.0));
    }

    #[test]
    fn zset_union_edge_cases() {
        let a = abc();
        // missing input is an empty set
        let union = ZSet::union(&[(Some(&a), 1.0), (None, 1.0)], Aggregate::Sum);
        assert_eq!(union.entries(), a.entries());
        assert!(ZSet::intersection(&[(Some(&a), 1.0), (None, 1.0)], Aggregate::Sum).is_empty());
        assert!(ZSet::intersection(&[(None, 1.0), (Some(&a), 1.0)], Aggregate::Sum).is_empty());

        // 0 * inf and inf + -inf both become 0
        let mut inf = ZSet::new();
        inf.add(f64::INFINITY, b("a")).unwrap();
        let weighted = ZSet::union(&[(Some(&inf), 0.0)], Aggregate::Sum);
        assert_eq!(weighted.score(b"a"), Some(0.0));
        let mut neg = ZSet::new();
        neg.add(f64::NEG_INFINITY, b("a")).unwrap();
        let sum = ZSet::union(&[(Some(&inf), 1.0), (Some(&neg), 1.0)], Aggregate::Sum);
        assert_eq!(sum.score(b"a"), Some(0.0));
    }

    #[test]
    fn zset_union_is_deterministic() {
        let sets: Vec<ZSet> = (0..4)
            .map(|k| {
                let mut zset = ZSet::new();
                for i in 0..100 {
                    zset.add(0.1 * (i * (k + 1)) as f64, Bytes::from(format!("m{}", i))).unwrap();
                }
                zset
            })
            .collect();
        let inputs: Vec<(Option<&ZSet>, f64)> = sets.iter().map(|s| (Some(s), 0.3)).collect();
        let first = ZSet::union(&inputs, Aggregate::Sum).entries();
        for _ in 0..5 {
            let again = ZSet::union(&inputs, Aggregate::Sum).entries();
            let bits = |e: &Vec<ScoredEntry>| e.iter().map(|x| x.score.to_bits()).collect::<Vec<_>>();
            assert_eq!(bits(&first), bits(&again));
        }
    }

    #[test]
    fn zset_aggregate_parse() {
        assert_eq!("sum".parse::<Aggregate>().unwrap(), Aggregate::Sum);
        assert_eq!("MIN".parse::<Aggregate>().unwrap(), Aggregate::Min);
        assert_eq!("Max".parse::<Aggregate>().unwrap(), Aggregate::Max);
        assert!("avg".parse::<Aggregate>().is_err());
        assert_eq!(Aggregate::default(), Aggregate::Sum);
    }

    #[test]
    fn zset_serde_round_trip() {
        let mut zset = numbered(5);
        zset.add(2.0, b("tie")).unwrap();
        let json = serde_json::to_string(&zset).unwrap();
        let back: ZSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back.entries(), zset.entries());
        assert_eq!(back.rank(b"tie"), zset.rank(b"tie"));
    }

    #[test]
    fn zset_clone_is_independent() {
        let zset = abc();
        let mut copy = zset.clone();
        copy.add(0.0, b("z")).unwrap();
        copy.remove(b"c");
        assert_eq!(zset.len(), 3);
        assert_eq!(copy.first(), Some(b("z")));
        assert!(zset.contains(b"c"));
    }

    #[test]
    fn error_wire_codes() {
        let err = ZSetError::InvalidArgument("negative offset -1".to_string());
        assert_eq!(err.to_wire(), "INVALIDARG negative offset -1");
        assert_eq!(ZSetError::from_wire(&err.to_wire()), Some(err));
        assert_eq!(ZSetError::from_wire("NAN"), Some(ZSetError::NotANumber));
        assert_eq!(ZSetError::from_wire("ERR unknown command"), None);
    }

    #[test]
    fn db_modify_drops_empty_sets() {
        let mut db = RedisDb::create(3);
        db.modify("k", |z| z.add(1.0, b("a")).unwrap());
        assert_eq!(db.db_size(), 1);
        assert_eq!(db.find("k").map(ZSet::len), Some(1));

        // a read against a missing key does not create it
        let rank = db.modify("missing", |z| z.rank(b"a"));
        assert_eq!(rank, None);
        assert!(db.find("missing").is_none());

        db.modify("k", |z| z.remove(b"a"));
        assert!(db.find("k").is_none());
        assert_eq!(db.db_size(), 0);
    }

    #[test]
    fn db_replace_and_delete() {
        let mut db = RedisDb::create(0);
        assert_eq!(db.replace("d".to_string(), abc()), 3);
        assert_eq!(db.find("d").map(ZSet::len), Some(3));
        assert_eq!(db.replace("d".to_string(), ZSet::new()), 0);
        assert!(db.find("d").is_none());

        db.replace("d".to_string(), abc());
        assert!(db.delete("d"));
        assert!(!db.delete("d"));
    }
}

//! Detector lifecycle: model violations, poisoning and debugging controls
use crate::common::*;
use forkrace_engine::{AccessProps, CallKind, DetectorConfig, DetectorError, Preset, ShimEvent};

fn is_violation(err: &DetectorError, expected: &str) -> bool {
    matches!(err, DetectorError::ModelViolation { event, .. } if *event == expected)
}

#[test]
fn test_detach_continue_without_detach() {
    let (mut detector, _heap) = detector();
    let err = detector.detach_continue(id(1), 0).unwrap_err();
    assert!(is_violation(&err, "detach_continue"), "{err}");
}

#[test]
fn test_detach_continue_region_mismatch() {
    let (mut detector, _heap) = detector();
    detector.detach(id(1), 0).unwrap();
    let err = detector.detach_continue(id(1), 1).unwrap_err();
    assert!(is_violation(&err, "detach_continue"), "{err}");
}

#[test]
fn test_fatal_error_poisons_later_events() {
    let (mut detector, _heap) = detector();
    detector.iteration_end(id(1)).unwrap_err();

    let err = detector
        .store(id(2), 0x1000, 4, 4, AccessProps::plain())
        .unwrap_err();
    assert!(is_violation(&err, "store"));
    assert!(err.to_string().contains("earlier failure"));
    assert!(detector.finish().is_err());
}

#[test]
fn test_function_return_with_unsynced_spawn() {
    let events = ProgramBuilder::new()
        .event(ShimEvent::EnterFunction { id: id(1) })
        .event(ShimEvent::Detach {
            id: id(2),
            region: 0,
        })
        .event(ShimEvent::DetachContinue {
            id: id(2),
            region: 0,
        })
        .event(ShimEvent::FunctionReturn { id: id(3) })
        .build();

    let (mut detector, _heap) = detector();
    let err = detector.replay(events).unwrap_err();
    assert!(is_violation(&err, "function_return"), "{err}");
}

#[test]
fn test_function_return_after_sync() {
    let events = ProgramBuilder::new()
        .event(ShimEvent::EnterFunction { id: id(1) })
        .spawn(2, 0, |child| {
            child.write(10, 0x1000, 4);
        })
        .sync(3, 0)
        .event(ShimEvent::FunctionReturn { id: id(4) })
        .build();

    let (detector, summary) = run(events);
    assert_eq!(detector.frame_depth(), 1);
    assert!(!summary.has_races());
}

#[test]
fn test_leave_syncs_implicitly() {
    let events = ProgramBuilder::new()
        .call(1, |callee| {
            callee.spawn(2, 0, |child| {
                child.write(10, 0x1000, 4);
            });
        })
        .write(11, 0x1000, 4)
        .build();

    let (_, summary) = run(events);
    assert!(!summary.has_races());
}

#[test]
fn test_strict_sync_requires_a_spawn() {
    let (mut detector, _heap) = detector();
    let err = detector.sync(id(1), 3).unwrap_err();
    assert!(is_violation(&err, "sync"), "{err}");

    let (mut lenient, _heap) = detector_with(DetectorConfig::preset(Preset::Lenient));
    lenient.sync(id(1), 3).unwrap();
    lenient.finish().unwrap();
}

#[test]
fn test_finish_with_open_frames() {
    let (mut detector, _heap) = detector();
    detector.enter_function(id(1)).unwrap();
    let err = detector.finish().unwrap_err();
    assert!(is_violation(&err, "finish"), "{err}");
}

#[test]
fn test_events_after_finish_are_rejected() {
    let (mut detector, _heap) = detector();
    detector.finish().unwrap();
    assert!(detector.is_finished());

    let err = detector.enter_function(id(1)).unwrap_err();
    assert!(is_violation(&err, "enter_function"));
    assert!(detector.finish().is_err());
}

#[test]
fn test_mismatched_call_return() {
    let (mut detector, _heap) = detector();
    detector.record_call(id(1), CallKind::Call).unwrap();
    let err = detector.record_call_return(id(2), CallKind::Call).unwrap_err();
    assert!(is_violation(&err, "record_call_return"), "{err}");
}

#[test]
fn test_lock_release_without_acquire() {
    let (mut detector, _heap) = detector();
    let err = detector.release_lock(9).unwrap_err();
    assert!(is_violation(&err, "lock_release"), "{err}");
}

#[test]
fn test_stack_frame_underflow() {
    let (mut detector, _heap) = detector();
    let err = detector.pop_stack_frame().unwrap_err();
    assert!(is_violation(&err, "pop_stack_frame"), "{err}");
}

#[test]
fn test_misaligned_access() {
    let (mut detector, _heap) = detector();
    let err = detector
        .load(id(1), 0x1000, 4, 3, AccessProps::plain())
        .unwrap_err();
    assert!(is_violation(&err, "access"), "{err}");
}

#[test]
fn test_bag_limit_exhaustion() {
    let config = DetectorConfig::default().with_limits(forkrace_engine::config::LimitsConfig {
        max_bags: 3,
        ..Default::default()
    });
    let (mut detector, _heap) = detector_with(config);

    detector.enter_function(id(1)).unwrap();
    detector.enter_function(id(2)).unwrap();
    let err = detector.enter_function(id(3)).unwrap_err();
    assert!(matches!(err, DetectorError::ResourceExhausted { .. }));
}

#[test]
fn test_sync_region_out_of_range() {
    let config = DetectorConfig::default().with_limits(forkrace_engine::config::LimitsConfig {
        max_sync_regions: 4,
        ..Default::default()
    });
    let (mut detector, _heap) = detector_with(config);

    detector.detach(id(1), 3).unwrap();
    detector.detach_continue(id(1), 3).unwrap();
    let err = detector.detach(id(2), 100_000_000).unwrap_err();
    assert!(matches!(
        err,
        DetectorError::ResourceExhausted { what: "sync regions per frame", limit: 4 }
    ));
    assert_eq!(detector.frame_depth(), 1);

    let err = detector.sync(id(3), 3).unwrap_err();
    assert!(is_violation(&err, "sync"));
    assert!(err.to_string().contains("earlier failure"));
}

#[test]
fn test_loop_end_region_out_of_range() {
    let (mut detector, _heap) = detector();
    detector.loop_begin(id(1)).unwrap();
    let err = detector.loop_end(id(2), u32::MAX).unwrap_err();
    assert!(matches!(err, DetectorError::ResourceExhausted { .. }), "{err}");
}

#[test]
fn test_pause_on_first_distinct_race_only() {
    let (mut detector, _heap) = detector_with(DetectorConfig::default().with_pause_on_race(true));
    detector.detach(id(1), 0).unwrap();
    detector
        .store(id(10), 0x1000, 4, 4, AccessProps::plain())
        .unwrap();
    detector
        .store(id(20), 0x2000, 4, 4, AccessProps::plain())
        .unwrap();
    detector.detach_continue(id(1), 0).unwrap();

    let err = detector
        .store(id(11), 0x1000, 4, 4, AccessProps::plain())
        .unwrap_err();
    match err {
        DetectorError::PausedOnRace {
            first,
            second,
            addr,
        } => {
            assert_eq!((first, second, addr), (id(10), id(11), 0x1000));
        }
        other => panic!("expected pause, got {other}"),
    }

    // The pause is not fatal and only fires once
    detector
        .store(id(21), 0x2000, 4, 4, AccessProps::plain())
        .unwrap();
    detector.sync(id(2), 0).unwrap();
    let summary = detector.finish().unwrap();
    assert_eq!(summary.distinct_races, 2);
}

#[test]
fn test_disabled_checking_ignores_accesses() {
    let (mut detector, _heap) = detector();
    detector.detach(id(1), 0).unwrap();
    detector.disable_checking().unwrap();
    detector.disable_checking().unwrap();
    detector
        .store(id(10), 0x1000, 4, 4, AccessProps::plain())
        .unwrap();
    detector.enable_checking().unwrap();
    detector
        .store(id(11), 0x1004, 4, 4, AccessProps::plain())
        .unwrap();
    detector.enable_checking().unwrap();
    detector
        .store(id(12), 0x1008, 4, 4, AccessProps::plain())
        .unwrap();
    detector.detach_continue(id(1), 0).unwrap();

    detector
        .store(id(20), 0x1000, 12, 4, AccessProps::plain())
        .unwrap();
    detector.sync(id(2), 0).unwrap();
    let summary = detector.finish().unwrap();

    assert_eq!(race_pairs(&summary).len(), 1);
    assert_eq!(summary.races[0].record.first.id, id(12));
}

#[test]
fn test_enable_without_disable() {
    let (mut detector, _heap) = detector();
    let err = detector.enable_checking().unwrap_err();
    assert!(is_violation(&err, "enable_checking"), "{err}");
}

#[test]
fn test_call_stack_tracks_spawns_and_loops() {
    let (mut detector, _heap) = detector();
    detector.record_call(id(1), CallKind::Call).unwrap();
    detector.enter_function(id(1)).unwrap();
    detector.detach(id(2), 0).unwrap();
    assert_eq!(detector.call_stack().depth(), 2);
    assert_eq!(detector.call_stack().top().map(|site| site.kind), Some(CallKind::Spawn));

    detector.detach_continue(id(2), 0).unwrap();
    detector.loop_begin(id(3)).unwrap();
    detector.iteration_begin(id(3)).unwrap();
    assert_eq!(detector.call_stack().top().map(|site| site.kind), Some(CallKind::Loop));
    detector.iteration_end(id(3)).unwrap();
    detector.loop_end(id(3), 1).unwrap();
    detector.leave(id(1)).unwrap();
    detector.record_call_return(id(1), CallKind::Call).unwrap();

    assert!(detector.call_stack().is_empty());
    assert_eq!(detector.frame_depth(), 1);
    detector.finish().unwrap();
}

#[test]
fn test_empty_parallel_loop() {
    let events = ProgramBuilder::new()
        .parallel_for(1, 0, 0, |_, _| {})
        .sync(2, 0)
        .build();

    let (detector, summary) = run(events);
    assert_eq!(detector.frame_depth(), 1);
    assert!(!summary.has_races());
}

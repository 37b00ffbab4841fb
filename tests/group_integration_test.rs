//! Group scopes: joint restoration and validation of several interceptions.

mod common;

use common::{setup, setup_with};
use interpose::{
    assert_failure_count, assert_result_ok, assert_validation_failure, call_args, CountBound,
    ErrorCode, ExpectCalls, InterposeConfig, InterposeError,
};
use pretty_assertions::assert_eq;
use serde_json::json;

#[test]
fn test_together_validates_all_members() {
    let (sample, wp) = setup();
    let guard = wp.together();

    let cpu = wp.intercept("os.cpu_count").unwrap().expect_once().set_return(1);
    let pid = wp.intercept("os.getpid").unwrap().expect_once().set_return(2);
    assert!(cpu.is_grouped() && pid.is_grouped());

    assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(1)));
    assert_eq!(sample.os.call("getpid", &call_args!()), Ok(json!(2)));

    // Member drops leave everything to the group.
    drop(cpu);
    drop(pid);
    assert!(sample.os.getattr("cpu_count").unwrap().as_substitute().is_some());

    assert_result_ok!(guard.close());
    assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
    assert_eq!(sample.os.call("getpid", &call_args!()), Ok(json!(4242)));
}

#[test]
fn test_group_reports_every_failure() {
    let (sample, wp) = setup();

    let outcome = wp.run_together(|| {
        let _cpu = wp.intercept("os.cpu_count")?.expect_once();
        let _pid = wp.intercept("os.getpid")?.expect_never();
        sample.os.call("getpid", &call_args!()).ok();
        Ok(())
    });

    let err = assert_failure_count!(outcome, 2);
    assert_eq!(err.code(), ErrorCode::GROUP_FAILED);
    assert!(err.to_string().starts_with("2 interception(s) failed validation:"));
    assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
    assert_eq!(sample.os.call("getpid", &call_args!()), Ok(json!(4242)));
}

#[test]
fn test_group_first_failure_only() {
    let config = InterposeConfig::default().collect_group_failures(false);
    let (sample, wp) = setup_with(config);

    let outcome = wp.run_together(|| {
        let _cpu = wp.intercept("os.cpu_count")?.expect_once();
        let _pid = wp.intercept("os.getpid")?.expect_once();
        Ok(())
    });

    assert_validation_failure!(outcome, "os.cpu_count", CountBound::Exactly(1), 0);
    assert_eq!(sample.os.call("getpid", &call_args!()), Ok(json!(4242)));
}

#[test]
fn test_nested_scope_does_not_close_outer() {
    let (sample, wp) = setup();
    let outer = wp.together();
    let _cpu = wp.intercept("os.cpu_count").unwrap().set_return(1);

    {
        let inner = wp.together();
        let _pid = wp.intercept("os.getpid").unwrap().set_return(2);
        assert_eq!(wp.group().depth(), 2);
        inner.close().unwrap();
    }

    assert_eq!(wp.group().len(), 2);
    assert_eq!(sample.os.call("getpid", &call_args!()), Ok(json!(2)));

    outer.close().unwrap();
    assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
    assert_eq!(sample.os.call("getpid", &call_args!()), Ok(json!(4242)));
}

#[test]
fn test_wrapped_function_runs_in_fresh_scope() {
    let (sample, wp) = setup();
    let os = sample.os.clone();

    let count_twice = wp.wrap_together(|expected: usize| {
        let _cpu = wp
            .intercept("os.cpu_count")?
            .expect(ExpectCalls::times(expected));
        os.call("cpu_count", &call_args!()).ok();
        os.call("cpu_count", &call_args!()).ok();
        Ok(())
    });

    assert_result_ok!(count_twice(2));
    let err = count_twice(3).unwrap_err();
    assert!(matches!(err, InterposeError::Validation(ref f) if f.actual == 2));
    assert!(!wp.group().is_active());
}

#[test]
fn test_validate_without_restore_keeps_patches() {
    let (sample, wp) = setup();
    wp.group().start();
    let _cpu = wp.intercept("os.cpu_count").unwrap().expect_once().set_return(5);
    sample.os.call("cpu_count", &call_args!()).unwrap();

    assert_result_ok!(wp.validate(false));
    assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(5)));

    assert_result_ok!(wp.validate(true));
    assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
}

#[test]
fn test_failed_in_place_validation_still_fails_close() {
    let (sample, wp) = setup();
    let guard = wp.together();
    let _cpu = wp
        .intercept("os.cpu_count")
        .unwrap()
        .expect(ExpectCalls::times(1));

    for _ in 0..2 {
        assert_validation_failure!(wp.validate(false), "os.cpu_count", CountBound::Exactly(1), 0);
    }

    assert_validation_failure!(guard.close(), "os.cpu_count", CountBound::Exactly(1), 0);
    assert_eq!(sample.os.call("cpu_count", &call_args!()), Ok(json!(8)));
}

#[test]
#[should_panic(expected = "expect os.cpu_count called with ANY 1 times, actual: 0")]
fn test_dropped_guard_panics_on_failure() {
    let (_sample, wp) = setup();
    let _guard = wp.together();
    let _cpu = wp.intercept("os.cpu_count").unwrap().expect_once();
}

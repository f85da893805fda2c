mod common;
use common::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fibre_courier::marker::{INTERMEDIATE_RESPONSE, POST_ERROR, POST_RESPONSE};
use fibre_courier::{
  FetchError, FinishReason, InlinePoster, PostError, Poster, Response, ResponseDelivery, ThreadPoster,
};
use pretty_assertions::assert_eq;

fn manual_delivery() -> (Arc<ManualPoster>, ResponseDelivery) {
  let poster = ManualPoster::new();
  let delivery = ResponseDelivery::new(poster.clone());
  (poster, delivery)
}

#[test]
fn final_success_delivers_once_then_finishes_done() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  delivery
    .post_response(request.clone(), Response::success("body".to_string(), None))
    .unwrap();

  // Nothing happens on the producer side beyond the marker.
  assert!(request.events().is_empty());
  assert_eq!(request.markers(), vec![POST_RESPONSE]);
  assert!(request.state.has_had_response_delivered());

  assert_eq!(poster.run_all(), 1);
  assert_eq!(
    request.events(),
    vec![
      Event::Response("body".to_string()),
      Event::Finish(FinishReason::Done),
    ]
  );
}

#[test]
fn intermediate_leaves_request_open_until_final() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  let stale = Response::success("stale".to_string(), None).into_intermediate();
  delivery.post_response(request.clone(), stale).unwrap();
  poster.run_all();

  assert_eq!(request.events(), vec![Event::Response("stale".to_string())]);
  assert!(request.finishes().is_empty());
  assert!(!request.state.is_finished());

  delivery
    .post_response(request.clone(), Response::success("fresh".to_string(), None))
    .unwrap();
  poster.run_all();

  assert_eq!(
    request.events(),
    vec![
      Event::Response("stale".to_string()),
      Event::Response("fresh".to_string()),
      Event::Finish(FinishReason::Done),
    ]
  );
  assert_eq!(
    request.markers(),
    vec![POST_RESPONSE, INTERMEDIATE_RESPONSE, POST_RESPONSE, "done"]
  );
}

#[test]
fn canceled_before_task_runs_suppresses_callback() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  delivery
    .post_response(request.clone(), Response::success("body".to_string(), None))
    .unwrap();
  request.cancel();
  poster.run_all();

  assert_eq!(
    request.events(),
    vec![Event::Finish(FinishReason::CanceledAtDelivery)]
  );
  assert!(request.responses().is_empty());
}

#[test]
fn cancellation_is_checked_at_run_time_not_post_time() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  request.cancel();
  delivery
    .post_error(request.clone(), FetchError::Timeout)
    .unwrap();
  // Marker is still appended on the producer side.
  assert_eq!(request.markers(), vec![POST_ERROR]);

  poster.run_all();
  assert_eq!(
    request.events(),
    vec![Event::Finish(FinishReason::CanceledAtDelivery)]
  );
}

#[test]
fn post_error_delivers_error_then_finishes_done() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();
  let error = FetchError::Server { status: 503 };

  delivery.post_error(request.clone(), error.clone()).unwrap();
  poster.run_all();

  assert_eq!(
    request.events(),
    vec![Event::Error(error), Event::Finish(FinishReason::Done)]
  );
  assert_eq!(request.markers(), vec![POST_ERROR, "done"]);
  // Errors do not count as a delivered response.
  assert!(!request.state.has_had_response_delivered());
}

#[test]
fn error_flavored_response_goes_to_error_callback() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  delivery
    .post_response(request.clone(), Response::error(FetchError::parse("bad json")))
    .unwrap();
  poster.run_all();

  assert_eq!(
    request.events(),
    vec![
      Event::Error(FetchError::parse("bad json")),
      Event::Finish(FinishReason::Done),
    ]
  );
}

#[test]
fn deliveries_run_in_submission_order() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  delivery
    .post_response(
      request.clone(),
      Response::success("x".to_string(), None).into_intermediate(),
    )
    .unwrap();
  delivery
    .post_response(request.clone(), Response::success("y".to_string(), None))
    .unwrap();
  assert_eq!(poster.pending(), 2);

  poster.run_all();
  assert_eq!(request.responses(), vec!["x", "y"]);
  assert_eq!(request.finishes(), vec![FinishReason::Done]);
}

#[test]
fn on_delivered_runs_after_finish() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  let observed = Arc::new(parking_lot::Mutex::new(Vec::new()));
  let observed_clone = observed.clone();
  let request_clone = request.clone();
  delivery
    .post_response_then(
      request.clone(),
      Response::success("body".to_string(), None),
      move || {
        *observed_clone.lock() = request_clone.events();
      },
    )
    .unwrap();
  poster.run_all();

  assert_eq!(
    *observed.lock(),
    vec![
      Event::Response("body".to_string()),
      Event::Finish(FinishReason::Done),
    ]
  );
}

#[test]
fn on_delivered_is_skipped_for_canceled_request() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();
  let calls = Arc::new(AtomicUsize::new(0));
  let calls_clone = calls.clone();

  delivery
    .post_response_then(
      request.clone(),
      Response::success("body".to_string(), None),
      move || {
        calls_clone.fetch_add(1, Ordering::SeqCst);
      },
    )
    .unwrap();
  request.cancel();
  poster.run_all();

  assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn cancel_on_poster_context_suppresses_queued_final_delivery() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();

  // The intermediate delivery's follow-up cancels from the consumer context,
  // which is the only strict way to stop the queued final delivery.
  let request_clone = request.clone();
  delivery
    .post_response_then(
      request.clone(),
      Response::success("stale".to_string(), None).into_intermediate(),
      move || request_clone.cancel(),
    )
    .unwrap();
  delivery
    .post_response(request.clone(), Response::success("fresh".to_string(), None))
    .unwrap();
  poster.run_all();

  assert_eq!(
    request.events(),
    vec![
      Event::Response("stale".to_string()),
      Event::Finish(FinishReason::CanceledAtDelivery),
    ]
  );
}

#[test]
fn closed_poster_rejects_posts() {
  let (poster, delivery) = manual_delivery();
  let request = RecordingRequest::new();
  poster.close();

  let result = delivery.post_response(request.clone(), Response::success("body".to_string(), None));
  assert_eq!(result, Err(PostError::Closed));
  assert!(request.events().is_empty());
}

#[test]
fn inline_poster_delivers_synchronously() {
  let delivery = ResponseDelivery::with_poster(InlinePoster);
  let request = RecordingRequest::new();

  delivery
    .post_response(request.clone(), Response::success("now".to_string(), None))
    .unwrap();

  assert_eq!(request.responses(), vec!["now"]);
  assert_eq!(request.finishes(), vec![FinishReason::Done]);
}

#[test]
fn thread_poster_delivers_on_its_own_thread() {
  let poster = Arc::new(ThreadPoster::builder().name("delivery-test").build().unwrap());
  let delivery = ResponseDelivery::new(poster.clone());
  let request = RecordingRequest::new();

  let thread_name = Arc::new(parking_lot::Mutex::new(None));
  let thread_name_clone = thread_name.clone();
  delivery
    .post_response_then(
      request.clone(),
      Response::success("body".to_string(), None),
      move || {
        *thread_name_clone.lock() = std::thread::current().name().map(str::to_owned);
      },
    )
    .unwrap();
  flush(poster.as_ref());

  assert_eq!(thread_name.lock().as_deref(), Some("delivery-test"));
  assert_eq!(request.finishes(), vec![FinishReason::Done]);
  poster.shutdown();
}

#[test]
fn many_producers_each_request_finishes_exactly_once() {
  let poster = Arc::new(ThreadPoster::spawn().unwrap());
  let delivery = ResponseDelivery::new(poster.clone());
  let requests: Vec<_> = (0..64).map(|_| RecordingRequest::new()).collect();

  let handles: Vec<_> = requests
    .chunks(16)
    .map(|chunk| {
      let delivery = delivery.clone();
      let chunk = chunk.to_vec();
      std::thread::spawn(move || {
        for (i, request) in chunk.into_iter().enumerate() {
          let stale = Response::success(format!("stale-{i}"), None).into_intermediate();
          delivery.post_response(request.clone(), stale).unwrap();
          if i % 3 == 0 {
            delivery.post_error(request, FetchError::NoConnection).unwrap();
          } else {
            delivery
              .post_response(request, Response::success(format!("fresh-{i}"), None))
              .unwrap();
          }
        }
      })
    })
    .collect();
  for handle in handles {
    handle.join().unwrap();
  }
  flush(poster.as_ref());

  for request in &requests {
    assert_eq!(request.finishes(), vec![FinishReason::Done]);
    let events = request.events();
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], Event::Response(ref s) if s.starts_with("stale")));
    assert_eq!(events[2], Event::Finish(FinishReason::Done));
  }
  poster.shutdown();
}

#[test]
fn posts_after_thread_poster_shutdown_fail() {
  let poster = Arc::new(ThreadPoster::spawn().unwrap());
  let delivery = ResponseDelivery::new(poster.clone());
  poster.shutdown();

  let request = RecordingRequest::new();
  assert_eq!(
    delivery.post_error(request.clone(), FetchError::Timeout),
    Err(PostError::Closed)
  );
  assert!(poster.post(Box::new(|| {})).is_err());
}

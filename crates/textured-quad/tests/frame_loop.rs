use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use textured_quad::frame::{Command, FramePhase, ResourceState};
use textured_quad::headless::{create_driver, CompletionMode, GpuEvent, HeadlessGpu};
use textured_quad::scene::{QuadBindings, Scene};
use textured_quad::{parse_args, Config, Error};

fn config(args: &[&str]) -> Config {
    parse_args(
        std::iter::once("textured-quad")
            .chain(args.iter().copied())
            .map(String::from),
    )
    .unwrap()
}

fn scene() -> Scene {
    Scene::new(1280, 720, QuadBindings::DEFAULT)
}

// everything but the one-off render-target view creation
fn frame_events(gpu: &HeadlessGpu) -> Vec<GpuEvent> {
    gpu.events()
        .into_iter()
        .filter(|e| !matches!(e, GpuEvent::CreateRenderTargetView { .. }))
        .collect()
}

#[test]
fn fence_target_grows_by_one_per_frame() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    for expected in 1..=5u64 {
        let report = driver.render_frame(|r| scene.record(r)).unwrap();
        assert_eq!(report.fence_value.get(), expected);
        assert_eq!(driver.fence().target().get(), expected);
        assert!(driver.fence().is_idle());
    }
    assert_eq!(driver.frame_count(), 5);
    assert_eq!(gpu.signaled_value(), 5);
}

#[test]
fn frame_steps_run_in_order() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    driver.render_frame(|r| scene.record(r)).unwrap();
    driver.render_frame(|r| scene.record(r)).unwrap();

    // clear, draw and the two barriers around them
    let commands = 2 + 2 + 9;
    assert_eq!(
        frame_events(&gpu),
        vec![
            GpuEvent::Execute { commands },
            GpuEvent::Present {
                image: 0,
                sync_interval: 1
            },
            GpuEvent::Signal(1),
            GpuEvent::AllocatorReset,
            GpuEvent::Execute { commands },
            GpuEvent::Present {
                image: 1,
                sync_interval: 1
            },
            GpuEvent::Signal(2),
            GpuEvent::AllocatorReset,
        ]
    );
}

#[test]
fn images_alternate_with_two_buffers() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    let images: Vec<_> = (0..5)
        .map(|_| driver.render_frame(|r| scene.record(r)).unwrap().image_index)
        .collect();
    assert_eq!(images, vec![0, 1, 0, 1, 0]);
}

#[test]
fn images_rotate_through_three_buffers() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &config(&["--buffers", "3", "--immediate"])).unwrap();
    let scene = scene();

    let images: Vec<_> = (0..4)
        .map(|_| driver.render_frame(|r| scene.record(r)).unwrap().image_index)
        .collect();
    assert_eq!(images, vec![0, 1, 2, 0]);
    assert!(gpu
        .events()
        .iter()
        .all(|e| !matches!(e, GpuEvent::Present { sync_interval, .. } if *sync_interval != 0)));
}

#[test]
fn current_image_is_stable_until_present() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    let first = driver.surface().current_image().unwrap();
    let second = driver.surface().current_image().unwrap();
    assert_eq!(first, second);

    driver.render_frame(|r| scene.record(r)).unwrap();
    let next = driver.surface().current_image().unwrap();
    assert_eq!(next.index, 1);
    assert_ne!(next.view, first.view);
}

#[test]
fn frame_waits_for_the_gpu() {
    let gpu = HeadlessGpu::recording(CompletionMode::Manual);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let scene = scene();
        let result = driver.render_frame(|r| scene.record(r));
        tx.send(result.map(|report| report.fence_value.get())).unwrap();
        driver
    });

    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    let deadline = Instant::now() + Duration::from_secs(5);
    while gpu.signaled_value() < 1 {
        assert!(Instant::now() < deadline, "the frame never signaled");
        thread::sleep(Duration::from_millis(1));
    }
    assert_eq!(gpu.completed_value(), 0);

    gpu.complete_through(1);
    let fence_value = rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();
    assert_eq!(fence_value, 1);

    let driver = worker.join().unwrap();
    assert_eq!(driver.phase(), FramePhase::Idle);

    let events = frame_events(&gpu);
    let position = |event: &GpuEvent| events.iter().position(|e| e == event).unwrap();
    assert!(position(&GpuEvent::Signal(1)) < position(&GpuEvent::WaitBegin(1)));
    assert!(position(&GpuEvent::WaitEnd(1)) < position(&GpuEvent::AllocatorReset));
}

#[test]
fn failed_present_stops_the_loop() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    gpu.fail_next_present();
    assert!(matches!(
        driver.render_frame(|r| scene.record(r)),
        Err(Error::Gpu(_))
    ));
    assert_eq!(driver.phase(), FramePhase::Submitted);

    assert!(matches!(
        driver.render_frame(|r| scene.record(r)),
        Err(Error::InvalidPhase {
            expected: FramePhase::Idle,
            actual: FramePhase::Submitted,
        })
    ));
    assert!(!gpu
        .events()
        .iter()
        .any(|e| matches!(e, GpuEvent::Signal(_))));
    assert_eq!(gpu.submissions().len(), 1);
}

#[test]
fn flush_after_failed_present_waits_for_the_submitted_list() {
    let gpu = HeadlessGpu::recording(CompletionMode::Manual);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    gpu.fail_next_present();
    assert!(driver.render_frame(|r| scene.record(r)).is_err());
    assert_eq!(driver.phase(), FramePhase::Submitted);
    assert_eq!(gpu.submission_count(), 1);

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        tx.send(driver.flush()).unwrap();
        driver
    });

    let deadline = Instant::now() + Duration::from_secs(5);
    while gpu.signaled_value() < 1 {
        assert!(Instant::now() < deadline, "flush never signaled");
        thread::sleep(Duration::from_millis(1));
    }
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    gpu.complete_through(1);
    rx.recv_timeout(Duration::from_secs(5)).unwrap().unwrap();

    let driver = worker.join().unwrap();
    assert!(driver.fence().is_idle());
    assert_eq!(gpu.completed_value(), 1);
    // the failed frame is still not retried
    assert_eq!(driver.phase(), FramePhase::Submitted);
}

#[test]
fn failed_draw_leaves_the_driver_recording() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();

    let result = driver.render_frame(|_| Err(Error::Gpu("draw failed".into())));
    assert!(result.is_err());
    assert_eq!(driver.phase(), FramePhase::Recording);
    assert!(gpu.submissions().is_empty());
}

#[test]
fn backbuffers_return_to_present_between_frames() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &config(&["--buffers", "3"])).unwrap();
    let scene = scene();

    for _ in 0..4 {
        driver.render_frame(|r| scene.record(r)).unwrap();
        assert!(driver
            .image_states()
            .iter()
            .all(|s| *s == ResourceState::Present));
    }
}

#[test]
fn each_submission_wraps_the_draw_in_two_barriers() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    for _ in 0..3 {
        driver.render_frame(|r| scene.record(r)).unwrap();
    }

    let submissions = gpu.submissions();
    assert_eq!(submissions.len(), 3);
    for (frame, commands) in submissions.iter().enumerate() {
        let image = frame % 2;
        let barriers: Vec<_> = commands
            .iter()
            .filter(|c| matches!(c, Command::Barrier { .. }))
            .collect();
        assert_eq!(
            barriers,
            vec![
                &Command::Barrier {
                    image,
                    before: ResourceState::Present,
                    after: ResourceState::RenderTarget,
                },
                &Command::Barrier {
                    image,
                    before: ResourceState::RenderTarget,
                    after: ResourceState::Present,
                },
            ]
        );
        assert!(matches!(commands.first(), Some(Command::Barrier { .. })));
        assert!(matches!(commands.last(), Some(Command::Barrier { .. })));
    }
}

#[test]
fn flush_leaves_no_outstanding_work() {
    let gpu = HeadlessGpu::recording(CompletionMode::Immediate);
    let mut driver = create_driver(&gpu, &Config::default()).unwrap();
    let scene = scene();

    driver.render_frame(|r| scene.record(r)).unwrap();
    driver.flush().unwrap();

    assert_eq!(gpu.signaled_value(), 2);
    assert_eq!(gpu.completed_value(), 2);
    assert!(driver.fence().is_idle());
}

use tracing::{debug, info};
use windows::Win32::{
    Foundation::{HWND, LPARAM, LRESULT, RECT, WPARAM},
    System::LibraryLoader::GetModuleHandleA,
    UI::{Input::KeyboardAndMouse::GetKeyboardState, WindowsAndMessaging::*},
};

use crate::error::{Error, Result};
use crate::input::{Key, Keyboard, KEY_COUNT};
use crate::renderer::Renderer;
use crate::Config;

/// Opens the window and renders until it is closed, Escape is pressed or the
/// frame limit is reached.
pub fn run(config: &Config) -> Result<()> {
    let name = windows::core::s!("textured_quad");

    let instance = unsafe { GetModuleHandleA(None)? };

    let wnd_class = WNDCLASSEXA {
        cbSize: std::mem::size_of::<WNDCLASSEXA>() as u32,
        style: CS_HREDRAW | CS_VREDRAW, // redraw when window size or position changes, horizontally and vertically
        lpfnWndProc: Some(wnd_proc),
        hInstance: instance.into(),
        hCursor: unsafe { LoadCursorW(None, IDC_ARROW)? },
        lpszClassName: name,
        ..Default::default()
    };
    if unsafe { RegisterClassExA(&wnd_class) } == 0 {
        return Err(windows::core::Error::from_win32().into());
    }

    let mut rect = RECT {
        left: 0,
        top: 0,
        right: client_extent(config.client_width())?,
        bottom: client_extent(config.client_height())?,
    };

    let hwnd = unsafe {
        AdjustWindowRect(&mut rect, WS_OVERLAPPEDWINDOW, false)?;

        CreateWindowExA(
            WINDOW_EX_STYLE::default(),
            name,
            windows::core::s!("Textured quad"),
            WS_OVERLAPPEDWINDOW,
            CW_USEDEFAULT,
            CW_USEDEFAULT,
            rect.right - rect.left,
            rect.bottom - rect.top,
            None,
            None,
            instance,
            None,
        )?
    };

    let mut renderer = Renderer::new(hwnd, config)?;

    unsafe {
        let _ = ShowWindow(hwnd, SW_SHOW);
    }

    let result = message_loop(hwnd, &mut renderer, config.frame_limit());

    // the swap chain and queue must be idle before anything is released
    let flushed = renderer.flush();
    if let Err(e) = unsafe { DestroyWindow(hwnd) } {
        debug!("window already destroyed: {e}");
    }

    result.and(flushed)
}

fn message_loop(hwnd: HWND, renderer: &mut Renderer, frame_limit: Option<u64>) -> Result<()> {
    let mut keyboard = Keyboard::default();
    let mut snapshot = [0u8; KEY_COUNT];
    let mut msg = MSG::default();

    loop {
        while unsafe { PeekMessageA(&mut msg, None, 0, 0, PM_REMOVE) }.into() {
            if msg.message == WM_QUIT {
                info!("window closed");
                return Ok(());
            }
            unsafe {
                let _ = TranslateMessage(&msg);
                DispatchMessageA(&msg);
            }
        }

        unsafe { GetKeyboardState(&mut snapshot) }?;
        keyboard.update(&snapshot);
        if keyboard.is_triggered(Key::ESCAPE) {
            info!("escape pressed");
            unsafe { DestroyWindow(hwnd) }?;
            continue;
        }

        renderer.update(&keyboard);
        let report = renderer.render()?;

        let rendered = report.frame + 1;
        if frame_limit.is_some_and(|limit| rendered >= limit) {
            info!(frames = rendered, "frame limit reached");
            return Ok(());
        }
    }
}

fn client_extent(value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| Error::Config(format!("{value} is too large for a window")))
}

extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match msg {
        WM_DESTROY => {
            unsafe {
                PostQuitMessage(0);
            }
            LRESULT::default()
        }
        _ => unsafe { DefWindowProcA(hwnd, msg, wparam, lparam) },
    }
}

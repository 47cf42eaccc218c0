use alarm_core::config::ENCODER_SETTLE;
use embassy_futures::select::{Either, select};
use embassy_stm32::exti::ExtiInput;
use embassy_time::Timer;

use super::{MENU_ENCODER, to_embassy};

/// Feeds phase edges to the shared decoder once the contacts have settled.
#[embassy_executor::task]
pub async fn run(mut phase_a: ExtiInput<'static>, mut phase_b: ExtiInput<'static>) -> ! {
    let settle = to_embassy(ENCODER_SETTLE);
    loop {
        let edge = select(phase_a.wait_for_any_edge(), phase_b.wait_for_any_edge()).await;
        Timer::after(settle).await;
        match edge {
            Either::First(()) => MENU_ENCODER.on_phase_a_changed(phase_a.is_low()),
            Either::Second(()) => MENU_ENCODER.on_phase_b_changed(phase_b.is_low()),
        }
    }
}

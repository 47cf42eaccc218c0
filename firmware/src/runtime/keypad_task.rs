use alarm_core::config::POLL_PERIOD;
use alarm_core::keypad::Keypad;
use embassy_time::Ticker;

use super::{KEY_QUEUE, to_embassy};
use crate::hw::keypad::MatrixKeypad;

#[embassy_executor::task]
pub async fn run(mut keypad: MatrixKeypad<'static>) -> ! {
    let keys = KEY_QUEUE.sender();
    let mut ticker = Ticker::every(to_embassy(POLL_PERIOD));
    loop {
        if let Some(key) = keypad.poll_key()
            && keys.try_send(key).is_err()
        {
            defmt::warn!("keypad: queue full, dropped '{}'", key);
        }
        ticker.next().await;
    }
}

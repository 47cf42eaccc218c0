use alarm_core::config::POLL_PERIOD;
use alarm_core::controller::{Controller, TickInputs};
use alarm_core::dashboard::CharacterDisplay;
use alarm_core::sensors::{Readings, SensorSchedule};
use alarm_core::time::Millis;
use embassy_time::{Instant, Ticker};

use super::{KEY_QUEUE, MENU_ENCODER, to_embassy};
use crate::hw::analog::BatteryAdc;
use crate::hw::lcd::CharacterLcd;
use crate::hw::onewire::Ds18b20;
use crate::hw::{Contacts, Outputs};
use crate::telemetry::TelemetryRecorder;

/// Board resources owned by the poll loop.
pub struct AlarmHardware {
    pub contacts: Contacts<'static>,
    pub outputs: Outputs<'static>,
    pub analog: BatteryAdc<'static>,
    pub sensor: Ds18b20<'static>,
    /// Absent when the display did not answer at start-up.
    pub lcd: Option<CharacterLcd>,
    pub telemetry: &'static mut TelemetryRecorder,
}

#[embassy_executor::task]
pub async fn run(hardware: AlarmHardware) -> ! {
    let AlarmHardware {
        contacts,
        mut outputs,
        mut analog,
        mut sensor,
        mut lcd,
        telemetry,
    } = hardware;

    let mut controller = Controller::with_defaults();
    let mut sensors = SensorSchedule::default();
    let mut readings = Readings::default();
    let keys = KEY_QUEUE.receiver();
    let mut ticker = Ticker::every(to_embassy(POLL_PERIOD));

    loop {
        let now = board_millis();
        sensors.refresh(now, &mut readings, &mut analog, &mut sensor);

        let encoder = MENU_ENCODER.snapshot();
        if encoder.rotating_left || encoder.rotating_right {
            defmt::debug!("encoder: position {}", encoder.position);
            MENU_ENCODER.reset_rotating();
        }

        let inputs = TickInputs {
            now,
            raw: contacts.read_raw(),
            encoder: Some(encoder.position),
            key: keys.try_receive().ok(),
            readings,
        };
        let result = controller.tick(&inputs);

        outputs.apply(&result);
        telemetry.observe(now, &result);

        if let Some(intent) = &result.display
            && let Some(lcd) = lcd.as_mut()
            && lcd.render(intent).is_err()
        {
            defmt::warn!("lcd: render failed");
        }

        ticker.next().await;
    }
}

/// Board uptime folded into the wrapping 32-bit millisecond counter.
#[allow(clippy::cast_possible_truncation)]
fn board_millis() -> Millis {
    Millis::new(Instant::now().as_millis() as u32)
}

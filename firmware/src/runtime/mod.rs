use cortex_m::interrupt;
use cortex_m::register::primask;
use critical_section::{self, RawRestoreState};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_stm32 as hal;
use embassy_stm32::adc::{Adc, AdcChannel};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, Output, OutputOpenDrain, Pull, Speed};
use embassy_stm32::i2c::{self, I2c};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::Delay;
use static_cell::StaticCell;

use alarm_core::encoder::{BoundsPolicy, MENU_ENCODER_RANGE, QuadratureDecoder, SharedEncoder};

use crate::hw::analog::BatteryAdc;
use crate::hw::keypad::MatrixKeypad;
use crate::hw::lcd::{CharacterLcd, DEFAULT_ADDRESS, LcdBus};
use crate::hw::onewire::Ds18b20;
use crate::hw::{Contacts, Outputs};
use crate::telemetry::TelemetryRecorder;

mod alarm_task;
mod encoder_task;
mod keypad_task;

critical_section::set_impl!(InterruptCriticalSection);

struct InterruptCriticalSection;

unsafe impl critical_section::Impl for InterruptCriticalSection {
    unsafe fn acquire() -> RawRestoreState {
        let primask = primask::read();
        interrupt::disable();
        primask.is_active()
    }

    unsafe fn release(restore_state: RawRestoreState) {
        if restore_state {
            unsafe {
                interrupt::enable();
            }
        }
    }
}

/// Keys waiting for the alarm task; extra presses are dropped when full.
pub const KEY_QUEUE_DEPTH: usize = 4;

pub(super) type KeyQueue = Channel<CriticalSectionRawMutex, char, KEY_QUEUE_DEPTH>;

pub(super) static KEY_QUEUE: KeyQueue = Channel::new();

/// Menu encoder shared between the EXTI task and the alarm loop.
pub(super) static MENU_ENCODER: SharedEncoder =
    SharedEncoder::new(QuadratureDecoder::new(MENU_ENCODER_RANGE, BoundsPolicy::Wrap));

static TELEMETRY: StaticCell<TelemetryRecorder> = StaticCell::new();
static LCD_BUS: StaticCell<LcdBus> = StaticCell::new();
static LCD_DELAY: StaticCell<Delay> = StaticCell::new();

fn to_embassy(duration: core::time::Duration) -> embassy_time::Duration {
    let micros = u64::try_from(duration.as_micros()).unwrap_or(u64::MAX);
    embassy_time::Duration::from_micros(micros)
}

#[embassy_executor::main]
pub async fn main(spawner: Spawner) {
    let config = hal::Config::default();
    let p = hal::init(config);

    let contacts = Contacts::new(
        Input::new(p.PA0, Pull::Down),
        [
            Input::new(p.PA1, Pull::Down),
            Input::new(p.PA9, Pull::Down),
            Input::new(p.PA10, Pull::Down),
        ],
    );
    let mut outputs = Outputs::new(
        Output::new(p.PA8, Level::Low, Speed::Low),
        Output::new(p.PA15, Level::Low, Speed::Low),
        Output::new(p.PB7, Level::Low, Speed::Low),
    );
    outputs.release_all();

    let keypad = MatrixKeypad::new(
        [
            Output::new(p.PB0, Level::High, Speed::Low),
            Output::new(p.PB1, Level::High, Speed::Low),
            Output::new(p.PB2, Level::High, Speed::Low),
            Output::new(p.PB3, Level::High, Speed::Low),
        ],
        [
            Input::new(p.PB4, Pull::Up),
            Input::new(p.PB5, Pull::Up),
            Input::new(p.PB6, Pull::Up),
        ],
    );

    let analog = BatteryAdc::new(
        Adc::new(p.ADC1),
        p.PA2.degrade_adc(),
        p.PA3.degrade_adc(),
        p.PA4.degrade_adc(),
    );
    let sensor = Ds18b20::new(OutputOpenDrain::new(p.PA5, Level::High, Speed::Low));

    let lcd_bus = LCD_BUS.init(I2c::new_blocking(
        p.I2C1,
        p.PB8,
        p.PB9,
        i2c::Config::default(),
    ));
    let lcd = match CharacterLcd::init(lcd_bus, LCD_DELAY.init(Delay), DEFAULT_ADDRESS) {
        Ok(lcd) => Some(lcd),
        Err(_) => {
            defmt::warn!("lcd: no response at 0x{:02x}, continuing without display", DEFAULT_ADDRESS);
            None
        }
    };

    let phase_a = ExtiInput::new(p.PA6, p.EXTI6, Pull::Up);
    let phase_b = ExtiInput::new(p.PA7, p.EXTI7, Pull::Up);

    let telemetry = TELEMETRY.init(TelemetryRecorder::new());

    spawner
        .spawn(encoder_task::run(phase_a, phase_b))
        .expect("failed to spawn encoder task");

    spawner
        .spawn(keypad_task::run(keypad))
        .expect("failed to spawn keypad task");

    spawner
        .spawn(alarm_task::run(alarm_task::AlarmHardware {
            contacts,
            outputs,
            analog,
            sensor,
            lcd,
            telemetry,
        }))
        .expect("failed to spawn alarm task");

    defmt::info!("camper alarm running");
    core::future::pending::<()>().await;
}

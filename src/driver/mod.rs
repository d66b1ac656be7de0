//! stm32f407 implementation of the board seam.
//!
//! Peripheral budget:
//!
//! * TIM3 ticks the system clock every [`timing::TICK_MICROS`] µs.
//! * TIM2 is the rearmable chip/timeout timer. It's one of the 32-bit
//!   timers, which matters: the noise timeout in Waiting is a full second of
//!   microseconds, far beyond a 16-bit ARR.
//! * EXTI0 on PA0 is the carrier-sense edge input.
//! * ADC1 channel 1 (PA1) reads the photodiode.
//! * USART1 (PA9/PA10) carries the decoded byte stream at 115200 baud.
//! * PC0 mirrors the recovered chip clock under the `measurement` feature.
//!
//! Concurrency: all three interrupts run at one NVIC priority, so handlers
//! never preempt each other, and the foreground loop polls inside a PRIMASK
//! critical section because state init/exit reprograms the same timer
//! registers the handlers touch. The critical section is a few microseconds
//! of decode work at worst; the system clock tick tolerates that much
//! latency by construction (its quantum dwarfs it).
//!
//! Register access from handlers goes through `Peripheral::ptr()` reads.
//! That is sound here because every register has a single writing context
//! once the one-priority rule and the polling critical section are in place.

use core::fmt;

use cortex_m::asm;
use stm32f4::stm32f407 as device;

use crate::board::Board;
use crate::clock::{Micros, SysClock};
use crate::receiver::{Demod, Receiver};
use crate::state::StateId;
use crate::timing;

/// Timer input clock at boot: HSI straight through, no PLL, no APB divide.
const TIMER_HZ: u32 = 16_000_000;
/// Prescaler bringing a timer down to 1 MHz, so ARR counts microseconds.
const PSC_1MHZ: u32 = TIMER_HZ / 1_000_000 - 1;
/// Shared NVIC priority for all three interrupt sources.
const IRQ_PRIORITY: u8 = 0x80;

/// The receiver singleton the interrupt trampolines dereference.
pub static RECEIVER: Receiver = Receiver::new();

static SYSCLOCK: SysClock = SysClock::new();

/// Brings up the hardware and runs the dispatcher forever. The binary calls
/// this once from its entry point after taking the peripherals.
pub fn run(mut cp: cortex_m::peripheral::Peripherals, p: device::Peripherals) -> ! {
    init_hw(&p);

    // Interrupt priorities first, then enables, with the barriers that make
    // the enables effective before we move on.
    unsafe {
        cp.NVIC.set_priority(device::Interrupt::TIM3, IRQ_PRIORITY);
        cp.NVIC.set_priority(device::Interrupt::TIM2, IRQ_PRIORITY);
        cp.NVIC.set_priority(device::Interrupt::EXTI0, IRQ_PRIORITY);
    }
    cp.NVIC.enable(device::Interrupt::TIM3);
    cp.NVIC.enable(device::Interrupt::TIM2);
    cp.NVIC.enable(device::Interrupt::EXTI0);
    asm::dmb();
    asm::isb();

    // Let the analog front end and the host's serial port settle before
    // trusting any edges.
    let t0 = SYSCLOCK.now();
    while SYSCLOCK.now() - t0 < 1_000_000 {}

    RECEIVER.state().set(StateId::Waiting);

    let mut demod = Demod::new();
    let mut board = Stm32Board;
    loop {
        cortex_m::interrupt::free(|_| demod.poll(&RECEIVER, &mut board));
    }
}

fn init_hw(p: &device::Peripherals) {
    // Clocks for everything we touch.
    p.RCC.ahb1enr.modify(|_, w| w.gpioaen().enabled().gpiocen().enabled());
    p.RCC
        .apb1enr
        .modify(|_, w| w.tim2en().enabled().tim3en().enabled());
    p.RCC.apb2enr.modify(|_, w| {
        w.adc1en()
            .enabled()
            .usart1en()
            .enabled()
            .syscfgen()
            .enabled()
    });

    // Pins: PA0 carrier sense in, PA1 photodiode analog, PA9/PA10 USART1.
    p.GPIOA.moder.modify(|_, w| {
        w.moder0()
            .input()
            .moder1()
            .analog()
            .moder9()
            .alternate()
            .moder10()
            .alternate()
    });
    p.GPIOA
        .afrh
        .modify(|_, w| w.afrh9().af7().afrh10().af7());
    #[cfg(feature = "measurement")]
    p.GPIOC.moder.modify(|_, w| w.moder0().output());

    // System tick: TIM3 free-running at the tick quantum.
    p.TIM3.psc.write(|w| unsafe { w.bits(PSC_1MHZ) });
    p.TIM3
        .arr
        .write(|w| unsafe { w.bits(timing::TICK_MICROS as u32 - 1) });
    p.TIM3.cr1.modify(|_, w| w.urs().set_bit());
    p.TIM3.egr.write(|w| w.ug().set_bit()); // latch the prescaler
    p.TIM3.dier.modify(|_, w| w.uie().set_bit());
    p.TIM3.cr1.modify(|_, w| w.cen().set_bit());

    // Chip/timeout timer: TIM2, stopped until a state arms it.
    p.TIM2.psc.write(|w| unsafe { w.bits(PSC_1MHZ) });
    p.TIM2.cr1.modify(|_, w| w.urs().set_bit());
    p.TIM2.egr.write(|w| w.ug().set_bit());
    p.TIM2.sr.modify(|_, w| w.uif().clear_bit());
    p.TIM2.dier.modify(|_, w| w.uie().set_bit());

    // ADC1: channel 1, software triggered, default sample time.
    p.ADC1.sqr3.modify(|_, w| unsafe { w.sq1().bits(1) });
    p.ADC1.cr2.modify(|_, w| w.adon().set_bit());

    // USART1: 115200-8-N-1 off the boot clock, transmit only. With 16x
    // oversampling the BRR value is just clock/baud.
    p.USART1
        .brr
        .write(|w| unsafe { w.bits(TIMER_HZ / 115_200) });
    p.USART1.cr1.modify(|_, w| w.ue().set_bit().te().set_bit());

    // Carrier sense: EXTI0 wired to PA0, rising edge, masked until a state
    // listens.
    p.SYSCFG
        .exticr1
        .modify(|_, w| unsafe { w.exti0().bits(0) });
    p.EXTI.rtsr.modify(|_, w| w.tr0().set_bit());
}

/// TIM3 update handler: one system-clock tick.
pub fn sys_tick_isr() {
    let tim = unsafe { &*device::TIM3::ptr() };
    tim.sr.modify(|_, w| w.uif().clear_bit());
    SYSCLOCK.tick(timing::TICK_MICROS);
}

/// TIM2 update handler: a chip-sample slot or a state timeout.
pub fn chip_timer_isr() {
    let tim = unsafe { &*device::TIM2::ptr() };
    tim.sr.modify(|_, w| w.uif().clear_bit());
    RECEIVER.on_timer(&mut Stm32Board);
}

/// EXTI0 handler: a carrier-sense rising edge.
pub fn carrier_isr() {
    let exti = unsafe { &*device::EXTI::ptr() };
    exti.pr.write(|w| w.pr0().set_bit());
    RECEIVER.on_carrier(&mut Stm32Board);
}

/// The board seam over real registers. Zero-sized; every call site conjures
/// one.
pub struct Stm32Board;

impl Board for Stm32Board {
    fn now(&self) -> Micros {
        SYSCLOCK.now()
    }

    fn sample(&mut self) -> i32 {
        let adc = unsafe { &*device::ADC1::ptr() };
        adc.cr2.modify(|_, w| w.swstart().set_bit());
        while adc.sr.read().eoc().bit_is_clear() {}
        adc.dr.read().data().bits() as i32
    }

    fn listen_carrier(&mut self, on: bool) {
        let exti = unsafe { &*device::EXTI::ptr() };
        if on {
            exti.pr.write(|w| w.pr0().set_bit()); // drop any stale edge
            exti.imr.modify(|_, w| w.mr0().set_bit());
        } else {
            exti.imr.modify(|_, w| w.mr0().clear_bit());
            cortex_m::peripheral::NVIC::unpend(device::Interrupt::EXTI0);
        }
    }

    fn set_timer_period(&mut self, period: Micros) {
        let tim = unsafe { &*device::TIM2::ptr() };
        // ARR is inclusive: the update fires after ARR+1 microsecond ticks.
        tim.arr
            .write(|w| unsafe { w.bits((period as u32).saturating_sub(1)) });
    }

    fn restart_timer(&mut self) {
        let tim = unsafe { &*device::TIM2::ptr() };
        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.cnt.write(|w| unsafe { w.bits(0) });
        tim.sr.modify(|_, w| w.uif().clear_bit());
        tim.cr1.modify(|_, w| w.cen().set_bit());
    }

    fn stop_timer(&mut self) {
        let tim = unsafe { &*device::TIM2::ptr() };
        tim.cr1.modify(|_, w| w.cen().clear_bit());
        tim.sr.modify(|_, w| w.uif().clear_bit());
        cortex_m::peripheral::NVIC::unpend(device::Interrupt::TIM2);
    }

    fn emit(&mut self, byte: u8) {
        let usart = unsafe { &*device::USART1::ptr() };
        while usart.sr.read().txe().bit_is_clear() {}
        usart.dr.write(|w| unsafe { w.bits(byte as u32) });
    }

    fn diag(&mut self, args: fmt::Arguments) {
        use fmt::Write;
        let mut port = SerialText;
        let _ = port.write_fmt(args);
        let _ = port.write_str("\r\n");
    }

    fn debug_edge(&mut self) {
        #[cfg(feature = "measurement")]
        {
            let gpioc = unsafe { &*device::GPIOC::ptr() };
            gpioc
                .odr
                .modify(|r, w| w.odr0().bit(!r.odr0().bit()));
        }
    }
}

/// `fmt::Write` adapter for diagnostic text on the byte sink.
struct SerialText;

impl fmt::Write for SerialText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &b in s.as_bytes() {
            Stm32Board.emit(b);
        }
        Ok(())
    }
}

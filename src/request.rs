//! Peripheral DMA requests
//!
//! Each peripheral that can pace a channel has a hardware interface
//! number (`PERID`). Use these constants with
//! [`ChannelConfig::DMA_REQUEST`](crate::ChannelConfig::DMA_REQUEST).
//! Instanced peripherals take the instance as a const parameter:
//!
//! ```
//! use same70_xdmac::{request, DmaRequest};
//!
//! assert_eq!(request::Usart::<1>::RX, DmaRequest::new(10));
//! assert_eq!(request::Afec::<0>::RX.id(), 35);
//! ```
//!
//! Values are for SAM E70/S70/V70/V71.

use crate::DmaRequest;

macro_rules! requests {
    (
        $(
            $(#[$attr:meta])*
            $name:ident $(<$inst:literal>)? { $($dir:ident = $id:literal),+ $(,)? }
        )+
    ) => {
        $(
            requests!(@impl $(#[$attr])* $name $(<$inst>)? { $($dir = $id),+ });
        )+
    };
    (@impl $(#[$attr:meta])* $name:ident { $($dir:ident = $id:literal),+ }) => {
        $(#[$attr])*
        #[derive(Debug)]
        pub struct $name;
        impl $name {
            $(
                #[allow(missing_docs)]
                pub const $dir: DmaRequest = DmaRequest::new($id);
            )+
        }
    };
    (@impl $(#[$attr:meta])* $name:ident <$inst:literal> { $($dir:ident = $id:literal),+ }) => {
        impl $name<$inst> {
            $(
                #[allow(missing_docs)]
                pub const $dir: DmaRequest = DmaRequest::new($id);
            )+
        }
    };
}

/// Serial peripheral interface, by instance.
#[derive(Debug)]
pub struct Spi<const N: usize>;
/// USART, by instance.
#[derive(Debug)]
pub struct Usart<const N: usize>;
/// PWM controller, by instance.
#[derive(Debug)]
pub struct Pwm<const N: usize>;
/// Two-wire interface, by instance.
#[derive(Debug)]
pub struct Twihs<const N: usize>;
/// UART, by instance.
#[derive(Debug)]
pub struct Uart<const N: usize>;
/// Analog front-end controller (ADC), by instance.
#[derive(Debug)]
pub struct Afec<const N: usize>;
/// Timer counter, by instance.
#[derive(Debug)]
pub struct Tc<const N: usize>;

requests! {
    /// High speed multimedia card interface. Shares one request for both directions.
    Hsmci { TX = 0, RX = 0 }
    Spi<0> { TX = 1, RX = 2 }
    Spi<1> { TX = 3, RX = 4 }
    /// Quad SPI
    Qspi { TX = 5, RX = 6 }
    Usart<0> { TX = 7, RX = 8 }
    Usart<1> { TX = 9, RX = 10 }
    Usart<2> { TX = 11, RX = 12 }
    Pwm<0> { TX = 13 }
    Twihs<0> { TX = 14, RX = 15 }
    Twihs<1> { TX = 16, RX = 17 }
    Twihs<2> { TX = 18, RX = 19 }
    Uart<0> { TX = 20, RX = 21 }
    Uart<1> { TX = 22, RX = 23 }
    Uart<2> { TX = 24, RX = 25 }
    Uart<3> { TX = 26, RX = 27 }
    Uart<4> { TX = 28, RX = 29 }
    /// Digital to analog converter
    Dacc { TX = 30 }
    /// Synchronous serial controller
    Ssc { TX = 32, RX = 33 }
    /// Parallel capture on PIO A
    Pioa { RX = 34 }
    Afec<0> { RX = 35 }
    Afec<1> { RX = 36 }
    /// AES engine
    Aes { TX = 37, RX = 38 }
    Pwm<1> { TX = 39 }
    Tc<0> { RX = 40 }
    Tc<1> { RX = 41 }
    Tc<2> { RX = 42 }
    Tc<3> { RX = 43 }
}

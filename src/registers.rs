//! Bit-level codec for the E220 operating registers.
//!
//! Three of the six configuration bytes pack several independent settings
//! into one byte. Each is modelled as a small codec type that stores the
//! decoded sub-fields and re-derives the packed byte on demand, so the byte
//! can never drift out of sync with the fields it is built from.
//!
//! ## Bit layout (MSB → LSB)
//!
//! | Register | 7..5 | 4..3 | 2..0 |
//! |----------|------|------|------|
//! | `REG0`   | UART baud rate | parity | air data rate |
//!
//! | Register | 7..6 | 5 | 4..2 | 1..0 |
//! |----------|------|---|------|------|
//! | `REG1`   | sub-packet size | ambient noise enable | reserved | TX power |
//!
//! | Register | 7 | 6 | 5 | 4 | 3 | 2..0 |
//! |----------|---|---|---|---|---|------|
//! | `REG3`   | RSSI byte enable | TX mode | reserved | LBT enable | reserved | WOR cycle |
//!
//! `REG2` is the channel number and needs no codec.
//!
//! ## Laws
//!
//! - `RegN::from_bits(b).bits() == b` for every byte `b`. Reserved bits are
//!   carried through untouched.
//! - Building a register from sub-field values and decoding its byte yields
//!   the same values.
//!
//! Values wider than their slot are masked, never rejected.

macro_rules! field_enum {
    (
        $(#[$meta:meta])*
        $name:ident: $mask:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        #[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
        #[repr(u8)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $name {
            /// Decodes the field from right-aligned bits. Excess bits are masked off.
            pub const fn from_bits(bits: u8) -> Self {
                match bits & $mask {
                    $( $value => $name::$variant, )+
                    _ => unreachable!(),
                }
            }

            /// Right-aligned bit pattern of this value.
            pub const fn bits(self) -> u8 {
                self as u8
            }
        }
    };
}

field_enum! {
    /// UART rate between the MCU and the module.
    ///
    /// Can differ between sender and receiver.
    UartBaudRate: 0b111 {
        /// 1200 baud
        Baud1200 = 0b000,
        /// 2400 baud
        Baud2400 = 0b001,
        /// 4800 baud
        Baud4800 = 0b010,
        /// 9600 baud, factory default and the only rate accepted in program mode
        #[default]
        Baud9600 = 0b011,
        /// 19200 baud
        Baud19200 = 0b100,
        /// 38400 baud
        Baud38400 = 0b101,
        /// 57600 baud
        Baud57600 = 0b110,
        /// 115200 baud
        Baud115200 = 0b111,
    }
}

impl UartBaudRate {
    /// The line rate in bits per second.
    pub const fn baud(self) -> u32 {
        match self {
            UartBaudRate::Baud1200 => 1_200,
            UartBaudRate::Baud2400 => 2_400,
            UartBaudRate::Baud4800 => 4_800,
            UartBaudRate::Baud9600 => 9_600,
            UartBaudRate::Baud19200 => 19_200,
            UartBaudRate::Baud38400 => 38_400,
            UartBaudRate::Baud57600 => 57_600,
            UartBaudRate::Baud115200 => 115_200,
        }
    }
}

field_enum! {
    /// UART framing.
    Parity: 0b11 {
        /// 8 data bits, no parity, 1 stop bit
        #[default]
        None = 0b00,
        /// 8 data bits, odd parity, 1 stop bit
        Odd = 0b01,
        /// 8 data bits, even parity, 1 stop bit
        Even = 0b10,
        /// Undocumented encoding the module treats as 8N1
        NoneAlt = 0b11,
    }
}

field_enum! {
    /// Over-the-air data rate. Must match on both ends of a link.
    AirDataRate: 0b111 {
        /// 2.4 kbps (alias)
        Bps2400A = 0b000,
        /// 2.4 kbps (alias)
        Bps2400B = 0b001,
        /// 2.4 kbps, factory default
        #[default]
        Bps2400 = 0b010,
        /// 4.8 kbps
        Bps4800 = 0b011,
        /// 9.6 kbps
        Bps9600 = 0b100,
        /// 19.2 kbps
        Bps19200 = 0b101,
        /// 38.4 kbps
        Bps38400 = 0b110,
        /// 62.5 kbps
        Bps62500 = 0b111,
    }
}

field_enum! {
    /// Largest chunk the module puts on air in one packet.
    SubPacketSize: 0b11 {
        /// 200 bytes, factory default
        #[default]
        Bytes200 = 0b00,
        /// 128 bytes
        Bytes128 = 0b01,
        /// 64 bytes
        Bytes64 = 0b10,
        /// 32 bytes
        Bytes32 = 0b11,
    }
}

impl SubPacketSize {
    /// Packet size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            SubPacketSize::Bytes200 => 200,
            SubPacketSize::Bytes128 => 128,
            SubPacketSize::Bytes64 => 64,
            SubPacketSize::Bytes32 => 32,
        }
    }
}

field_enum! {
    /// Transmit power step. The absolute level depends on the module variant:
    /// 22/17/13/10 dBm on 22 dBm parts, 30/27/24/21 dBm on 30 dBm parts.
    TransmitPower: 0b11 {
        /// Maximum output, factory default
        #[default]
        Highest = 0b00,
        /// Maximum minus ~4 dB
        High = 0b01,
        /// Maximum minus ~8 dB
        Medium = 0b10,
        /// Maximum minus ~12 dB
        Low = 0b11,
    }
}

field_enum! {
    /// How the module treats the first bytes of outgoing data.
    TransmissionMode: 0b1 {
        /// Everything written goes on air unchanged to the configured channel
        #[default]
        Transparent = 0b0,
        /// The first three bytes are target address high, low and channel
        Fixed = 0b1,
    }
}

field_enum! {
    /// Wake-on-radio listen period. Must match on both ends of a link.
    WorCycle: 0b111 {
        /// 500 ms
        Ms500 = 0b000,
        /// 1000 ms
        Ms1000 = 0b001,
        /// 1500 ms
        Ms1500 = 0b010,
        /// 2000 ms, factory default
        #[default]
        Ms2000 = 0b011,
        /// 2500 ms
        Ms2500 = 0b100,
        /// 3000 ms
        Ms3000 = 0b101,
        /// 3500 ms
        Ms3500 = 0b110,
        /// 4000 ms
        Ms4000 = 0b111,
    }
}

impl WorCycle {
    /// Period in milliseconds.
    pub const fn millis(self) -> u16 {
        (self.bits() as u16 + 1) * 500
    }
}

/// `REG0`: UART rate, parity and air data rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Reg0 {
    uart_baud_rate: UartBaudRate,
    parity: Parity,
    air_data_rate: AirDataRate,
}

impl Reg0 {
    /// Builds the register from its sub-fields.
    pub const fn new(
        uart_baud_rate: UartBaudRate,
        parity: Parity,
        air_data_rate: AirDataRate,
    ) -> Self {
        Self {
            uart_baud_rate,
            parity,
            air_data_rate,
        }
    }

    /// Decodes a packed register byte.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            uart_baud_rate: UartBaudRate::from_bits(bits >> 5),
            parity: Parity::from_bits(bits >> 3),
            air_data_rate: AirDataRate::from_bits(bits),
        }
    }

    /// The packed register byte.
    pub const fn bits(&self) -> u8 {
        (self.uart_baud_rate.bits() << 5) | (self.parity.bits() << 3) | self.air_data_rate.bits()
    }

    /// UART rate sub-field.
    pub const fn uart_baud_rate(&self) -> UartBaudRate {
        self.uart_baud_rate
    }

    /// Sets the UART rate sub-field.
    pub fn set_uart_baud_rate(&mut self, value: UartBaudRate) {
        self.uart_baud_rate = value;
    }

    /// Parity sub-field.
    pub const fn parity(&self) -> Parity {
        self.parity
    }

    /// Sets the parity sub-field.
    pub fn set_parity(&mut self, value: Parity) {
        self.parity = value;
    }

    /// Air data rate sub-field.
    pub const fn air_data_rate(&self) -> AirDataRate {
        self.air_data_rate
    }

    /// Sets the air data rate sub-field.
    pub fn set_air_data_rate(&mut self, value: AirDataRate) {
        self.air_data_rate = value;
    }
}

/// `REG1`: sub-packet size, ambient noise RSSI enable and transmit power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Reg1 {
    sub_packet_size: SubPacketSize,
    ambient_noise: bool,
    // bits 4..2, kept in place
    reserved: u8,
    transmit_power: TransmitPower,
}

impl Reg1 {
    const RESERVED_MASK: u8 = 0b0001_1100;

    /// Builds the register from its sub-fields. Reserved bits are zero.
    pub const fn new(
        sub_packet_size: SubPacketSize,
        ambient_noise: bool,
        transmit_power: TransmitPower,
    ) -> Self {
        Self {
            sub_packet_size,
            ambient_noise,
            reserved: 0,
            transmit_power,
        }
    }

    /// Decodes a packed register byte.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            sub_packet_size: SubPacketSize::from_bits(bits >> 6),
            ambient_noise: bits & 0b0010_0000 != 0,
            reserved: bits & Self::RESERVED_MASK,
            transmit_power: TransmitPower::from_bits(bits),
        }
    }

    /// The packed register byte.
    pub const fn bits(&self) -> u8 {
        (self.sub_packet_size.bits() << 6)
            | ((self.ambient_noise as u8) << 5)
            | (self.reserved & Self::RESERVED_MASK)
            | self.transmit_power.bits()
    }

    /// Sub-packet size sub-field.
    pub const fn sub_packet_size(&self) -> SubPacketSize {
        self.sub_packet_size
    }

    /// Sets the sub-packet size sub-field.
    pub fn set_sub_packet_size(&mut self, value: SubPacketSize) {
        self.sub_packet_size = value;
    }

    /// Whether the ambient noise RSSI registers are enabled.
    pub const fn ambient_noise(&self) -> bool {
        self.ambient_noise
    }

    /// Enables or disables the ambient noise RSSI registers.
    pub fn set_ambient_noise(&mut self, value: bool) {
        self.ambient_noise = value;
    }

    /// Transmit power sub-field.
    pub const fn transmit_power(&self) -> TransmitPower {
        self.transmit_power
    }

    /// Sets the transmit power sub-field.
    pub fn set_transmit_power(&mut self, value: TransmitPower) {
        self.transmit_power = value;
    }
}

/// `REG3`: RSSI byte enable, transmission mode, LBT enable and WOR cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Reg3 {
    rssi_byte: bool,
    transmission_mode: TransmissionMode,
    // bits 5 and 3, kept in place
    reserved: u8,
    lbt: bool,
    wor_cycle: WorCycle,
}

impl Reg3 {
    const RESERVED_MASK: u8 = 0b0010_1000;

    /// Builds the register from its sub-fields. Reserved bits are zero.
    pub const fn new(
        rssi_byte: bool,
        transmission_mode: TransmissionMode,
        lbt: bool,
        wor_cycle: WorCycle,
    ) -> Self {
        Self {
            rssi_byte,
            transmission_mode,
            reserved: 0,
            lbt,
            wor_cycle,
        }
    }

    /// Decodes a packed register byte.
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            rssi_byte: bits & 0b1000_0000 != 0,
            transmission_mode: TransmissionMode::from_bits(bits >> 6),
            reserved: bits & Self::RESERVED_MASK,
            lbt: bits & 0b0001_0000 != 0,
            wor_cycle: WorCycle::from_bits(bits),
        }
    }

    /// The packed register byte.
    pub const fn bits(&self) -> u8 {
        ((self.rssi_byte as u8) << 7)
            | (self.transmission_mode.bits() << 6)
            | (self.reserved & Self::RESERVED_MASK)
            | ((self.lbt as u8) << 4)
            | self.wor_cycle.bits()
    }

    /// Whether the module appends an RSSI byte to every received payload.
    pub const fn rssi_byte(&self) -> bool {
        self.rssi_byte
    }

    /// Enables or disables the trailing RSSI byte.
    pub fn set_rssi_byte(&mut self, value: bool) {
        self.rssi_byte = value;
    }

    /// Transmission mode sub-field.
    pub const fn transmission_mode(&self) -> TransmissionMode {
        self.transmission_mode
    }

    /// Sets the transmission mode sub-field.
    pub fn set_transmission_mode(&mut self, value: TransmissionMode) {
        self.transmission_mode = value;
    }

    /// Whether listen-before-talk is enabled.
    pub const fn lbt(&self) -> bool {
        self.lbt
    }

    /// Enables or disables listen-before-talk.
    pub fn set_lbt(&mut self, value: bool) {
        self.lbt = value;
    }

    /// Wake-on-radio cycle sub-field.
    pub const fn wor_cycle(&self) -> WorCycle {
        self.wor_cycle
    }

    /// Sets the wake-on-radio cycle sub-field.
    pub fn set_wor_cycle(&mut self, value: WorCycle) {
        self.wor_cycle = value;
    }
}

impl From<u8> for Reg0 {
    fn from(value: u8) -> Self {
        Self::from_bits(value)
    }
}

impl From<Reg0> for u8 {
    fn from(value: Reg0) -> Self {
        value.bits()
    }
}

impl From<u8> for Reg1 {
    fn from(value: u8) -> Self {
        Self::from_bits(value)
    }
}

impl From<Reg1> for u8 {
    fn from(value: Reg1) -> Self {
        value.bits()
    }
}

impl From<u8> for Reg3 {
    fn from(value: u8) -> Self {
        Self::from_bits(value)
    }
}

impl From<Reg3> for u8 {
    fn from(value: Reg3) -> Self {
        value.bits()
    }
}

//! ST7789 command set, register bit fields and the panel's default tables.

/// One-byte opcodes of the ST7789 system and panel function command tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Instruction {
    /// No Operation (00h)
    Nop = 0x00,
    /// Software Reset (01h) - Needs 120ms+ before the next command
    SoftwareReset = 0x01,
    /// Read Display ID (04h)
    ReadDisplayId = 0x04,
    /// Read Display Status (09h)
    ReadDisplayStatus = 0x09,
    /// Read Display Power Mode (0Ah)
    ReadDisplayPowerMode = 0x0A,
    /// Read Display MADCTL (0Bh)
    ReadMemoryAccessControl = 0x0B,
    /// Read Display Pixel Format (0Ch)
    ReadPixelFormat = 0x0C,
    /// Read Display Image Mode (0Dh)
    ReadImageMode = 0x0D,
    /// Read Display Signal Mode (0Eh)
    ReadSignalMode = 0x0E,
    /// Read Display Self-Diagnostic Result (0Fh)
    ReadSelfDiagnostic = 0x0F,

    /// Sleep In (10h) - Enter minimum power mode
    SleepIn = 0x10,
    /// Sleep Out (11h) - Leave minimum power mode
    SleepOut = 0x11,
    /// Partial Display Mode On (12h)
    PartialModeOn = 0x12,
    /// Normal Display Mode On (13h)
    NormalDisplayOn = 0x13,

    /// Display Inversion Off (20h)
    DisplayInversionOff = 0x20,
    /// Display Inversion On (21h)
    DisplayInversionOn = 0x21,
    /// Gamma Set (26h) - Select a predefined gamma curve
    GammaSet = 0x26,
    /// Display Off (28h)
    DisplayOff = 0x28,
    /// Display On (29h)
    DisplayOn = 0x29,
    /// Column Address Set (2Ah)
    ColumnAddressSet = 0x2A,
    /// Row Address Set (2Bh)
    RowAddressSet = 0x2B,
    /// Memory Write (2Ch)
    MemoryWrite = 0x2C,
    /// Memory Read (2Eh)
    MemoryRead = 0x2E,
    /// Partial Area (30h)
    PartialArea = 0x30,
    /// Vertical Scrolling Definition (33h)
    VerticalScrollDefinition = 0x33,
    /// Tearing Effect Line Off (34h)
    TearingEffectOff = 0x34,
    /// Tearing Effect Line On (35h)
    TearingEffectOn = 0x35,
    /// Memory Data Access Control (36h) - Scan direction, RGB/BGR order
    MemoryAccessControl = 0x36,
    /// Vertical Scroll Start Address of RAM (37h)
    VerticalScrollStartAddress = 0x37,
    /// Idle Mode Off (38h)
    IdleModeOff = 0x38,
    /// Idle Mode On (39h)
    IdleModeOn = 0x39,
    /// Interface Pixel Format (3Ah)
    PixelFormatSet = 0x3A,
    /// Write Memory Continue (3Ch)
    MemoryWriteContinue = 0x3C,
    /// Read Memory Continue (3Eh)
    MemoryReadContinue = 0x3E,
    /// Set Tear Scanline (44h)
    TearScanline = 0x44,
    /// Get Scanline (45h)
    GetScanline = 0x45,
    /// Write Display Brightness (51h)
    WriteBrightness = 0x51,
    /// Read Display Brightness (52h)
    ReadBrightness = 0x52,
    /// Write CTRL Display (53h)
    WriteCtrlDisplay = 0x53,
    /// Read CTRL Display (54h)
    ReadCtrlDisplay = 0x54,
    /// Write Content Adaptive Brightness Control and Color Enhancement (55h)
    WriteAdaptiveBrightness = 0x55,
    /// Read Content Adaptive Brightness Control (56h)
    ReadAdaptiveBrightness = 0x56,
    /// Write CABC Minimum Brightness (5Eh)
    WriteCabcMinimum = 0x5E,
    /// Read CABC Minimum Brightness (5Fh)
    ReadCabcMinimum = 0x5F,
    /// Read Automatic Brightness Control Self-Diagnostic Result (68h)
    ReadAbcSelfDiagnostic = 0x68,
    /// Read ID1 (DAh)
    ReadId1 = 0xDA,
    /// Read ID2 (DBh)
    ReadId2 = 0xDB,
    /// Read ID3 (DCh)
    ReadId3 = 0xDC,

    /// RAM Control (B0h)
    RamControl = 0xB0,
    /// RGB Interface Control (B1h)
    RgbInterfaceControl = 0xB1,
    /// Porch Setting (B2h)
    PorchControl = 0xB2,
    /// Frame Rate Control 1, partial/idle mode (B3h)
    FrameRateControl1 = 0xB3,
    /// Partial Control (B5h)
    PartialControl = 0xB5,
    /// Gate Control (B7h) - VGH/VGL voltages
    GateControl = 0xB7,
    /// Gate On Timing Adjustment (B8h)
    GateTimingAdjustment = 0xB8,
    /// Digital Gamma Enable (BAh)
    DigitalGammaEnable = 0xBA,
    /// VCOM Setting (BBh)
    VcomSetting = 0xBB,
    /// LCM Control (C0h) - XOR bits applied on top of MADCTL
    LcmControl = 0xC0,
    /// ID Code Setting (C1h)
    IdCodeSetting = 0xC1,
    /// VDV and VRH Command Enable (C2h)
    VdvVrhEnable = 0xC2,
    /// VRH Set (C3h)
    VrhSet = 0xC3,
    /// VDV Set (C4h)
    VdvSet = 0xC4,
    /// VCOM Offset Set (C5h)
    VcomOffsetSet = 0xC5,
    /// Frame Rate Control in Normal Mode (C6h)
    FrameRateControl2 = 0xC6,
    /// CABC Control (C7h)
    CabcControl = 0xC7,
    /// Register Value Selection 1 (C8h)
    RegisterSelection1 = 0xC8,
    /// Register Value Selection 2 (CAh)
    RegisterSelection2 = 0xCA,
    /// PWM Frequency Selection (CCh)
    PwmFrequency = 0xCC,
    /// Power Control 1 (D0h)
    PowerControl1 = 0xD0,
    /// Enable VAP/VAN Signal Output (D2h)
    VapVanEnable = 0xD2,
    /// Command 2 Enable (DFh)
    Command2Enable = 0xDF,
    /// Positive Voltage Gamma Control (E0h)
    PositiveGamma = 0xE0,
    /// Negative Voltage Gamma Control (E1h)
    NegativeGamma = 0xE1,
    /// Digital Gamma Look-up Table for Red (E2h)
    DigitalGammaRed = 0xE2,
    /// Digital Gamma Look-up Table for Blue (E3h)
    DigitalGammaBlue = 0xE3,
    /// Gate Control (E4h) - Gate line count and scan start
    GateScanControl = 0xE4,
    /// SPI2 Enable (E7h)
    Spi2Enable = 0xE7,
    /// Power Control 2 (E8h)
    PowerControl2 = 0xE8,
    /// Equalize Time Control (E9h)
    EqualizeControl = 0xE9,
    /// Program Mode Control (ECh)
    ProgramModeControl = 0xEC,
    /// Program Mode Enable (FAh)
    ProgramModeEnable = 0xFA,
    /// NVM Setting (FCh)
    NvmSetting = 0xFC,
    /// Program Action (FEh)
    ProgramAction = 0xFE,
}

impl From<Instruction> for u8 {
    fn from(instruction: Instruction) -> Self {
        instruction as u8
    }
}

// MADCTL (36h) bits
pub const MADCTL_MY_TB: u8 = 0x00; // Page address order top to bottom
pub const MADCTL_MY_BT: u8 = 0x80; // Page address order bottom to top
pub const MADCTL_MX_LR: u8 = 0x00; // Column address order left to right
pub const MADCTL_MX_RL: u8 = 0x40; // Column address order right to left
pub const MADCTL_MV_NORM: u8 = 0x00; // Page/column order normal
pub const MADCTL_MV_REV: u8 = 0x20; // Page/column order exchanged
pub const MADCTL_ML_TB: u8 = 0x00; // LCD refresh top to bottom
pub const MADCTL_ML_BT: u8 = 0x10; // LCD refresh bottom to top
pub const MADCTL_RGB: u8 = 0x00;
pub const MADCTL_BGR: u8 = 0x08;
pub const MADCTL_MH_LR: u8 = 0x00; // Latch order left to right
pub const MADCTL_MH_RL: u8 = 0x04; // Latch order right to left

// LCMCTRL (C0h) bits
pub const LCMCTRL_XMY: u8 = 0x40; // XOR MY setting in MADCTL
pub const LCMCTRL_XBGR: u8 = 0x20; // XOR RGB setting in MADCTL
pub const LCMCTRL_XREV: u8 = 0x10; // XOR inverse setting in INVON
pub const LCMCTRL_XMH: u8 = 0x08; // Reverse source output order
pub const LCMCTRL_XMV: u8 = 0x04; // XOR MV setting in MADCTL
pub const LCMCTRL_XMX: u8 = 0x02; // XOR MX setting in MADCTL
pub const LCMCTRL_XGS: u8 = 0x01; // XOR GS setting in GATECTRL

// VDVVRHEN (C2h)
pub const VDVVRHEN_CMDEN_NVM: u8 = 0x00; // VDV/VRH come from NVM
pub const VDVVRHEN_CMDEN_WRITE: u8 = 0x01; // VDV/VRH come from command write

// COLMOD (3Ah)
pub const COLMOD_RGB_65K: u8 = 0x50;
pub const COLMOD_RGB_262K: u8 = 0x60;
pub const COLMOD_CTRL_4K: u8 = 0x03;
pub const COLMOD_CTRL_65K: u8 = 0x05;
pub const COLMOD_CTRL_262K: u8 = 0x06;
pub const COLMOD_CTRL_16M: u8 = 0x07; // truncated to 18 bits

/// Rows of display RAM; the visible area is re-centered inside it with VSCSAD.
pub const GRAM_ROWS: u16 = 320;

pub const MAX_VSYNC_SCANLINES: u16 = 254;

/// Gate control: VGH 12.54V, VGL -9.6V.
pub const GATE_CONTROL: u8 = 0x14;
/// VCOM 0.575V.
pub const VCOM_SETTING: u8 = 0x37;
/// VAP(GVDD) = 4.45 + (vcom + vcom offset + 0.5 vdv).
pub const VRH_SETTING: u8 = 0x12;
/// VDV 0V.
pub const VDV_SETTING: u8 = 0x20;

pub const PORCH_CONTROL: [u8; 5] = [0x0C, 0x0C, 0x00, 0x33, 0x33];
pub const POWER_CONTROL: [u8; 2] = [0xA4, 0xA1];

pub const POSITIVE_GAMMA: [u8; 14] = [
    0xD0, 0x04, 0x0D, 0x11, 0x13, 0x2B, 0x3F, 0x54, 0x4C, 0x18, 0x0D, 0x0B, 0x1F, 0x23,
];
pub const NEGATIVE_GAMMA: [u8; 14] = [
    0xD0, 0x04, 0x0C, 0x11, 0x13, 0x2C, 0x3F, 0x44, 0x51, 0x2F, 0x1F, 0x1F, 0x20, 0x23,
];

/// Normal-mode frame rate codes for FRCTRL2 (C6h), named by refresh rate in Hz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum FrameRate {
    Hz119 = 0x00,
    Hz111 = 0x01,
    Hz105 = 0x02,
    Hz99 = 0x03,
    Hz94 = 0x04,
    Hz90 = 0x05,
    Hz86 = 0x06,
    Hz82 = 0x07,
    Hz78 = 0x08,
    Hz75 = 0x09,
    Hz72 = 0x0A,
    Hz69 = 0x0B,
    Hz67 = 0x0C,
    Hz64 = 0x0D,
    Hz62 = 0x0E,
    #[default]
    Hz60 = 0x0F,
    Hz58 = 0x10,
    Hz57 = 0x11,
    Hz55 = 0x12,
    Hz53 = 0x13,
    Hz52 = 0x14,
    Hz50 = 0x15,
    Hz49 = 0x16,
    Hz48 = 0x17,
    Hz46 = 0x18,
    Hz45 = 0x19,
    Hz44 = 0x1A,
    Hz43 = 0x1B,
    Hz42 = 0x1C,
    Hz41 = 0x1D,
    Hz40 = 0x1E,
    Hz39 = 0x1F,
}

impl FrameRate {
    /// FRCTRL2 parameter byte.
    pub fn code(self) -> u8 {
        self as u8
    }
}

/// Parameter bytes for the vertical scroll start address register.
pub fn vertical_scroll_offset(offset: u16) -> [u8; 2] {
    offset.to_be_bytes()
}

/// Column/row address range parameters: big-endian start then end.
pub fn address_range(start: u16, end: u16) -> [u8; 4] {
    let [s_hi, s_lo] = start.to_be_bytes();
    let [e_hi, e_lo] = end.to_be_bytes();
    [s_hi, s_lo, e_hi, e_lo]
}

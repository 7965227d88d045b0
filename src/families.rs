//! Family Catalog - Read-Only Hardware Metadata
//!
//! Static descriptors for every supported STM32 family, populated once and
//! never mutated at runtime. Lookup is typed: an unknown identifier is a
//! tagged miss the caller must handle, not a silent `None` deep in the
//! pipeline.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Enumerated family identifier. `FromStr` accepts the canonical uppercase
/// spelling used throughout configurations and generated artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Family {
    #[serde(rename = "STM32F0")]
    Stm32F0,
    #[serde(rename = "STM32F1")]
    Stm32F1,
    #[serde(rename = "STM32F2")]
    Stm32F2,
    #[serde(rename = "STM32F3")]
    Stm32F3,
    #[serde(rename = "STM32F4")]
    Stm32F4,
    #[serde(rename = "STM32F7")]
    Stm32F7,
    #[serde(rename = "STM32H7")]
    Stm32H7,
    #[serde(rename = "STM32L4")]
    Stm32L4,
    #[serde(rename = "STM32L5")]
    Stm32L5,
}

impl Family {
    pub const ALL: [Family; 9] = [
        Family::Stm32F0,
        Family::Stm32F1,
        Family::Stm32F2,
        Family::Stm32F3,
        Family::Stm32F4,
        Family::Stm32F7,
        Family::Stm32H7,
        Family::Stm32L4,
        Family::Stm32L5,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Stm32F0 => "STM32F0",
            Family::Stm32F1 => "STM32F1",
            Family::Stm32F2 => "STM32F2",
            Family::Stm32F3 => "STM32F3",
            Family::Stm32F4 => "STM32F4",
            Family::Stm32F7 => "STM32F7",
            Family::Stm32H7 => "STM32H7",
            Family::Stm32L4 => "STM32L4",
            Family::Stm32L5 => "STM32L5",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Family {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Family::ALL
            .iter()
            .copied()
            .find(|family| family.as_str() == s)
            .ok_or(())
    }
}

/// Cortex-M core classes present across the catalog. The class selects the
/// base minimum stack the core header derives from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CortexCore {
    #[serde(rename = "Cortex-M0")]
    M0,
    #[serde(rename = "Cortex-M0+")]
    M0Plus,
    #[serde(rename = "Cortex-M3")]
    M3,
    #[serde(rename = "Cortex-M4")]
    M4,
    #[serde(rename = "Cortex-M7")]
    M7,
    #[serde(rename = "Cortex-M33")]
    M33,
}

impl CortexCore {
    /// Base minimum stack in bytes. Higher-end cores need more room for
    /// exception frames and FPU context.
    pub fn base_stack(&self) -> u32 {
        match self {
            CortexCore::M0 | CortexCore::M0Plus => 512,
            CortexCore::M3 | CortexCore::M4 => 1024,
            CortexCore::M33 => 1536,
            CortexCore::M7 => 2048,
        }
    }
}

impl fmt::Display for CortexCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CortexCore::M0 => "Cortex-M0",
            CortexCore::M0Plus => "Cortex-M0+",
            CortexCore::M3 => "Cortex-M3",
            CortexCore::M4 => "Cortex-M4",
            CortexCore::M7 => "Cortex-M7",
            CortexCore::M33 => "Cortex-M33",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryVariant {
    pub flash_size: &'static str,
    pub ram_size: &'static str,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyFeatures {
    pub fpu: bool,
    pub trust_zone: bool,
    pub cache: bool,
    pub dma: bool,
    pub ethernet: bool,
    pub usb: bool,
    pub crypto: bool,
}

/// Static record describing one hardware family. Consumers must treat the
/// descriptor as read-only for the lifetime of a pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FamilyDescriptor {
    pub name: &'static str,
    pub cores: Vec<CortexCore>,
    pub series: Vec<&'static str>,
    pub memory_variants: BTreeMap<&'static str, MemoryVariant>,
    pub supported_peripherals: Vec<&'static str>,
    pub features: FamilyFeatures,
    pub boards: Vec<&'static str>,
    pub toolchains: Vec<&'static str>,
    pub applications: Vec<&'static str>,
}

impl FamilyDescriptor {
    /// The primary core drives stack sizing. The catalog guarantees every
    /// descriptor lists at least one core.
    pub fn primary_core(&self) -> CortexCore {
        self.cores[0]
    }
}

fn mv(flash_size: &'static str, ram_size: &'static str) -> MemoryVariant {
    MemoryVariant {
        flash_size,
        ram_size,
    }
}

/// Registry of family descriptors, built once from the literal table below.
/// Exposes no mutation operation.
pub struct FamilyCatalog {
    families: HashMap<Family, FamilyDescriptor>,
}

impl FamilyCatalog {
    pub fn new() -> Self {
        let mut families = HashMap::new();

        families.insert(
            Family::Stm32F0,
            FamilyDescriptor {
                name: "STM32F0",
                cores: vec![CortexCore::M0],
                series: vec!["STM32F0x0", "STM32F0x1", "STM32F0x2", "STM32F0x8"],
                memory_variants: BTreeMap::from([
                    ("16KB", mv("16KB", "4KB")),
                    ("32KB", mv("32KB", "6KB")),
                    ("64KB", mv("64KB", "8KB")),
                    ("128KB", mv("128KB", "16KB")),
                ]),
                supported_peripherals: vec!["GPIO", "UART", "SPI", "I2C", "ADC", "TIM"],
                features: FamilyFeatures {
                    dma: true,
                    usb: true,
                    ..Default::default()
                },
                boards: vec![],
                toolchains: vec![],
                applications: vec![],
            },
        );

        families.insert(
            Family::Stm32F1,
            FamilyDescriptor {
                name: "STM32F1",
                cores: vec![CortexCore::M3],
                series: vec![
                    "STM32F100", "STM32F101", "STM32F102", "STM32F103", "STM32F105", "STM32F107",
                ],
                memory_variants: BTreeMap::from([
                    ("64KB", mv("64KB", "20KB")),
                    ("128KB", mv("128KB", "32KB")),
                    ("256KB", mv("256KB", "48KB")),
                    ("512KB", mv("512KB", "64KB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN",
                ],
                features: FamilyFeatures {
                    dma: true,
                    ethernet: true,
                    usb: true,
                    ..Default::default()
                },
                boards: vec![],
                toolchains: vec![],
                applications: vec![],
            },
        );

        families.insert(
            Family::Stm32F2,
            FamilyDescriptor {
                name: "STM32F2",
                cores: vec![CortexCore::M3],
                series: vec!["STM32F205", "STM32F207", "STM32F215", "STM32F217"],
                memory_variants: BTreeMap::from([
                    ("128KB", mv("128KB", "64KB")),
                    ("256KB", mv("256KB", "96KB")),
                    ("512KB", mv("512KB", "128KB")),
                    ("1MB", mv("1MB", "128KB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN", "ETH", "USB_OTG",
                ],
                features: FamilyFeatures {
                    cache: true,
                    dma: true,
                    ethernet: true,
                    usb: true,
                    crypto: true,
                    ..Default::default()
                },
                boards: vec![],
                toolchains: vec![],
                applications: vec![],
            },
        );

        families.insert(
            Family::Stm32F3,
            FamilyDescriptor {
                name: "STM32F3",
                cores: vec![CortexCore::M4],
                series: vec!["STM32F301", "STM32F302", "STM32F303", "STM32F373", "STM32F334"],
                memory_variants: BTreeMap::from([
                    ("64KB", mv("64KB", "16KB")),
                    ("128KB", mv("128KB", "32KB")),
                    ("256KB", mv("256KB", "40KB")),
                    ("512KB", mv("512KB", "64KB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN", "USB",
                ],
                features: FamilyFeatures {
                    fpu: true,
                    dma: true,
                    usb: true,
                    ..Default::default()
                },
                boards: vec![],
                toolchains: vec![],
                applications: vec![],
            },
        );

        families.insert(
            Family::Stm32F4,
            FamilyDescriptor {
                name: "STM32F4",
                cores: vec![CortexCore::M4],
                series: vec![
                    "STM32F401", "STM32F405", "STM32F407", "STM32F410", "STM32F411", "STM32F412",
                    "STM32F413", "STM32F415", "STM32F417", "STM32F423", "STM32F427", "STM32F429",
                    "STM32F437", "STM32F439", "STM32F446", "STM32F469", "STM32F479",
                ],
                memory_variants: BTreeMap::from([
                    ("256KB", mv("256KB", "128KB")),
                    ("512KB", mv("512KB", "192KB")),
                    ("1MB", mv("1MB", "256KB")),
                    ("2MB", mv("2MB", "384KB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN", "ETH", "USB_OTG",
                    "DCMI", "FSMC",
                ],
                features: FamilyFeatures {
                    fpu: true,
                    cache: true,
                    dma: true,
                    ethernet: true,
                    usb: true,
                    crypto: true,
                    ..Default::default()
                },
                boards: vec!["NUCLEO-F429ZI", "STM32F429I-DISC1", "STM32F469I-DISCO"],
                toolchains: vec!["EWARM", "MDK-ARM", "STM32CubeIDE"],
                applications: vec!["ThreadX low power", "FileX SD card", "USBX device CDC"],
            },
        );

        families.insert(
            Family::Stm32F7,
            FamilyDescriptor {
                name: "STM32F7",
                cores: vec![CortexCore::M7],
                series: vec![
                    "STM32F722", "STM32F723", "STM32F732", "STM32F733", "STM32F745", "STM32F746",
                    "STM32F756", "STM32F765", "STM32F767", "STM32F769", "STM32F777", "STM32F779",
                ],
                memory_variants: BTreeMap::from([
                    ("512KB", mv("512KB", "256KB")),
                    ("1MB", mv("1MB", "384KB")),
                    ("2MB", mv("2MB", "512KB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN", "ETH", "USB_OTG",
                    "DCMI", "FMC", "QSPI",
                ],
                features: FamilyFeatures {
                    fpu: true,
                    cache: true,
                    dma: true,
                    ethernet: true,
                    usb: true,
                    crypto: true,
                    ..Default::default()
                },
                boards: vec!["NUCLEO-F767ZI", "STM32F746G-DISCO", "STM32F769I-DISCO"],
                toolchains: vec!["EWARM", "MDK-ARM", "STM32CubeIDE"],
                applications: vec!["NetX Duo webserver", "GUIX display demo"],
            },
        );

        families.insert(
            Family::Stm32H7,
            FamilyDescriptor {
                name: "STM32H7",
                cores: vec![CortexCore::M7, CortexCore::M4],
                series: vec![
                    "STM32H742", "STM32H743", "STM32H745", "STM32H747", "STM32H750", "STM32H753",
                    "STM32H755", "STM32H757",
                ],
                memory_variants: BTreeMap::from([
                    ("1MB", mv("1MB", "1MB")),
                    ("2MB", mv("2MB", "1MB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN", "ETH", "USB_OTG",
                    "DCMI", "FMC", "QSPI", "SDMMC",
                ],
                features: FamilyFeatures {
                    fpu: true,
                    trust_zone: true,
                    cache: true,
                    dma: true,
                    ethernet: true,
                    usb: true,
                    crypto: true,
                },
                boards: vec!["NUCLEO-H743ZI", "STM32H747I-DISCO", "STM32H735G-DK"],
                toolchains: vec!["EWARM", "MDK-ARM", "STM32CubeIDE"],
                applications: vec![
                    "ThreadX dual-core AMP",
                    "NetX Duo IoT telemetry",
                    "FileX eMMC",
                ],
            },
        );

        families.insert(
            Family::Stm32L4,
            FamilyDescriptor {
                name: "STM32L4",
                cores: vec![CortexCore::M4],
                series: vec![
                    "STM32L412", "STM32L422", "STM32L431", "STM32L432", "STM32L433", "STM32L442",
                    "STM32L443", "STM32L451", "STM32L452", "STM32L462", "STM32L471", "STM32L475",
                    "STM32L476", "STM32L485", "STM32L486", "STM32L496", "STM32L4A6",
                ],
                memory_variants: BTreeMap::from([
                    ("256KB", mv("256KB", "128KB")),
                    ("512KB", mv("512KB", "160KB")),
                    ("1MB", mv("1MB", "192KB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN", "USB", "LCD", "QSPI",
                ],
                features: FamilyFeatures {
                    fpu: true,
                    dma: true,
                    usb: true,
                    crypto: true,
                    ..Default::default()
                },
                boards: vec!["B-L475E-IOT01A", "NUCLEO-L476RG"],
                toolchains: vec!["EWARM", "MDK-ARM", "STM32CubeIDE"],
                applications: vec!["ThreadX low power", "USBX device MSC"],
            },
        );

        families.insert(
            Family::Stm32L5,
            FamilyDescriptor {
                name: "STM32L5",
                cores: vec![CortexCore::M33],
                series: vec!["STM32L552", "STM32L562"],
                memory_variants: BTreeMap::from([
                    ("256KB", mv("256KB", "256KB")),
                    ("512KB", mv("512KB", "256KB")),
                ]),
                supported_peripherals: vec![
                    "GPIO", "UART", "SPI", "I2C", "ADC", "DAC", "TIM", "CAN", "USB", "OCTOSPI",
                    "GTZC",
                ],
                features: FamilyFeatures {
                    fpu: true,
                    trust_zone: true,
                    cache: true,
                    dma: true,
                    usb: true,
                    crypto: true,
                    ..Default::default()
                },
                boards: vec!["NUCLEO-L552ZE-Q", "STM32L562E-DK"],
                toolchains: vec!["EWARM", "MDK-ARM", "STM32CubeIDE"],
                applications: vec!["ThreadX TrustZone"],
            },
        );

        Self { families }
    }

    /// Descriptor for a known family. Infallible: the table covers every
    /// `Family` variant.
    pub fn get(&self, family: Family) -> &FamilyDescriptor {
        &self.families[&family]
    }

    /// Typed lookup from an identifier string. A miss is a tagged result,
    /// not an `unwrap` waiting to happen.
    pub fn resolve(&self, id: &str) -> Option<(Family, &FamilyDescriptor)> {
        let family = Family::from_str(id).ok()?;
        Some((family, self.get(family)))
    }

    /// Descriptors in canonical enum order, for listings.
    pub fn families(&self) -> impl Iterator<Item = (Family, &FamilyDescriptor)> {
        Family::ALL.iter().map(move |family| (*family, self.get(*family)))
    }
}

impl Default for FamilyCatalog {
    fn default() -> Self {
        Self::new()
    }
}

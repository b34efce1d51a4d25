//! Breed code -> display class, as assigned by the game client.

use phf::phf_map;

static BREED_CLASSES: phf::Map<i32, &'static str> = phf_map! {
    1i32 => "Féca",
    2i32 => "Osamodas",
    3i32 => "Enutrof",
    4i32 => "Sram",
    5i32 => "Xélor",
    6i32 => "Ecaflip",
    7i32 => "Eniripsa",
    8i32 => "Iop",
    9i32 => "Crâ",
    10i32 => "Sadida",
    11i32 => "Sacrieur",
    12i32 => "Pandawa",
};

pub fn class_name_for_breed(breed: i32) -> Option<&'static str> {
    BREED_CLASSES.get(&breed).copied()
}

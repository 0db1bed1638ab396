//! The keymap blob handed to keyboards.
//!
//! Clients expect an xkb_v1 keymap; this compact US layout covers the
//! keys the terminal input path can actually produce. The blob is opaque
//! to the server itself.

pub const DEFAULT_KEYMAP: &str = r#"xkb_keymap {
    xkb_keycodes "evdev" {
        minimum = 8;
        maximum = 255;
        <ESC>  = 9;
        <AE01> = 10; <AE02> = 11; <AE03> = 12; <AE04> = 13; <AE05> = 14;
        <AE06> = 15; <AE07> = 16; <AE08> = 17; <AE09> = 18; <AE10> = 19;
        <AD01> = 24; <AD02> = 25; <AD03> = 26; <AD04> = 27; <AD05> = 28;
        <AD06> = 29; <AD07> = 30; <AD08> = 31; <AD09> = 32; <AD10> = 33;
        <AC01> = 38; <AC02> = 39; <AC03> = 40; <AC04> = 41; <AC05> = 42;
        <AC06> = 43; <AC07> = 44; <AC08> = 45; <AC09> = 46; <AC10> = 47;
        <AB01> = 52; <AB02> = 53; <AB03> = 54; <AB04> = 55; <AB05> = 56;
        <AB06> = 57; <AB07> = 58;
        <RTRN> = 36;
        <SPCE> = 65;
        <BKSP> = 22;
        <TAB>  = 23;
        <LFSH> = 50;
        <LCTL> = 37;
        <LALT> = 64;
        <UP>   = 111; <DOWN> = 116; <LEFT> = 113; <RGHT> = 114;
    };
    xkb_types "basic" {
        type "TWO_LEVEL" {
            modifiers = Shift;
            map[Shift] = Level2;
            level_name[Level1] = "Base";
            level_name[Level2] = "Shift";
        };
    };
    xkb_compatibility "basic" {
        interpret Shift_L { action = SetMods(modifiers=Shift); };
        interpret Control_L { action = SetMods(modifiers=Control); };
        interpret Alt_L { action = SetMods(modifiers=Mod1); };
    };
    xkb_symbols "us" {
        key <ESC>  { [ Escape ] };
        key <AE01> { [ 1, exclam ] };  key <AE02> { [ 2, at ] };
        key <AE03> { [ 3, numbersign ] }; key <AE04> { [ 4, dollar ] };
        key <AE05> { [ 5, percent ] }; key <AE06> { [ 6, asciicircum ] };
        key <AE07> { [ 7, ampersand ] }; key <AE08> { [ 8, asterisk ] };
        key <AE09> { [ 9, parenleft ] }; key <AE10> { [ 0, parenright ] };
        key <AD01> { [ q, Q ] }; key <AD02> { [ w, W ] };
        key <AD03> { [ e, E ] }; key <AD04> { [ r, R ] };
        key <AD05> { [ t, T ] }; key <AD06> { [ y, Y ] };
        key <AD07> { [ u, U ] }; key <AD08> { [ i, I ] };
        key <AD09> { [ o, O ] }; key <AD10> { [ p, P ] };
        key <AC01> { [ a, A ] }; key <AC02> { [ s, S ] };
        key <AC03> { [ d, D ] }; key <AC04> { [ f, F ] };
        key <AC05> { [ g, G ] }; key <AC06> { [ h, H ] };
        key <AC07> { [ j, J ] }; key <AC08> { [ k, K ] };
        key <AC09> { [ l, L ] }; key <AC10> { [ semicolon, colon ] };
        key <AB01> { [ z, Z ] }; key <AB02> { [ x, X ] };
        key <AB03> { [ c, C ] }; key <AB04> { [ v, V ] };
        key <AB05> { [ b, B ] }; key <AB06> { [ n, N ] };
        key <AB07> { [ m, M ] };
        key <RTRN> { [ Return ] };
        key <SPCE> { [ space ] };
        key <BKSP> { [ BackSpace ] };
        key <TAB>  { [ Tab ] };
        key <LFSH> { [ Shift_L ] };
        key <LCTL> { [ Control_L ] };
        key <LALT> { [ Alt_L ] };
        key <UP>   { [ Up ] }; key <DOWN> { [ Down ] };
        key <LEFT> { [ Left ] }; key <RGHT> { [ Right ] };
    };
};
"#;

/// The blob as bytes, NUL-terminated the way keymap consumers expect.
pub fn keymap_bytes() -> Vec<u8> {
    let mut bytes = DEFAULT_KEYMAP.as_bytes().to_vec();
    bytes.push(0);
    bytes
}

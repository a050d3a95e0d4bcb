use super::{hash_map, run_test, set_in_state, ExpectedState, ALL_REGISTERS};

use crate::cpu::registers::CpuRegister;

#[test]
fn add_immediate() {
    run_test(
        // LD A, 0x05; ADD 0xDE
        "3E05C6DE",
        &ExpectedState { a: Some(0xE3), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x01; ADD 0x03
        "3E01C603",
        &ExpectedState { a: Some(0x04), f: Some(0x00), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x55; ADD 0xAB
        "3E55C6AB",
        &ExpectedState { a: Some(0x00), f: Some(0xB0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xFF; ADD 0x12
        "3EFFC612",
        &ExpectedState { a: Some(0x11), f: Some(0x30), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xFF; SCF; ADD 0x12 (carry in is ignored by ADD)
        "3EFF37C612",
        &ExpectedState { a: Some(0x11), f: Some(0x30), ..ExpectedState::empty() },
    );
}

#[test]
fn add_register() {
    for r in ALL_REGISTERS {
        let load_opcode = 0x06 | (r.code() << 3);
        let add_opcode = 0x80 | r.code();

        let (expected_a, expected_f) = match r {
            CpuRegister::A => (0x68, 0x10),
            _ => (0xEA, 0x00),
        };

        run_test(
            // LD A, 0x36; LD <r>, 0xB4; ADD <r>
            &format!("3E36{load_opcode:02x}B4{add_opcode:02x}"),
            &ExpectedState { a: Some(expected_a), f: Some(expected_f), ..ExpectedState::empty() },
        );
    }
}

#[test]
fn add_register_half_carry() {
    // LD A, 0x3A; ADD A (doubles to 0x74 with a half carry)
    run_test(
        "3E3A87",
        &ExpectedState { a: Some(0x74), f: Some(0x20), ..ExpectedState::empty() },
    );

    // LD A, 0xF0; LD B, 0x20; ADD B (carries out of bit 7 only)
    run_test(
        "3EF0062080",
        &ExpectedState { a: Some(0x10), f: Some(0x10), ..ExpectedState::empty() },
    );
}

#[test]
fn add_indirect_hl() {
    run_test(
        // LD HL, 0xCDA4; LD (HL), 0x3B; LD A, 0xA1; ADD (HL)
        "21A4CD363B3EA186",
        &ExpectedState { a: Some(0xDC), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn adc_immediate() {
    run_test(
        // LD A, 0xBC; OR A (clears carry); ADC 0x15
        "3EBCB7CE15",
        &ExpectedState { a: Some(0xD1), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xBC; SCF; ADC 0x15
        "3EBC37CE15",
        &ExpectedState { a: Some(0xD2), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xFD; SCF; ADC 0x02
        "3EFD37CE02",
        &ExpectedState { a: Some(0x00), f: Some(0xB0), ..ExpectedState::empty() },
    );
}

#[test]
fn adc_indirect_hl() {
    run_test(
        // LD HL, 0xC612; LD (HL), 0xFD; LD A, 0x02; SCF; ADC (HL)
        "2112C636FD3E02378E",
        &ExpectedState { a: Some(0x00), f: Some(0xB0), ..ExpectedState::empty() },
    );
}

#[test]
fn sub_immediate() {
    run_test(
        // LD A, 0x3E; SUB 0x3E
        "3E3ED63E",
        &ExpectedState { a: Some(0x00), f: Some(0xC0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x3E; SUB 0x0F (borrow from bit 4)
        "3E3ED60F",
        &ExpectedState { a: Some(0x2F), f: Some(0x60), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x3E; SUB 0x40 (full borrow)
        "3E3ED640",
        &ExpectedState { a: Some(0xFE), f: Some(0x50), ..ExpectedState::empty() },
    );
}

#[test]
fn sub_register() {
    for r in ALL_REGISTERS {
        if r == CpuRegister::A {
            continue;
        }

        let load_opcode = 0x06 | (r.code() << 3);
        let sub_opcode = 0x90 | r.code();

        let mut expected_state =
            ExpectedState { a: Some(0x6F), f: Some(0x70), ..ExpectedState::empty() };
        set_in_state(&mut expected_state, r, 0xB4);

        run_test(
            // LD A, 0x23; LD <r>, 0xB4; SUB <r>
            &format!("3E23{load_opcode:02x}B4{sub_opcode:02x}"),
            &expected_state,
        );
    }

    // SUB A always produces zero
    run_test(
        "3E9197",
        &ExpectedState { a: Some(0x00), f: Some(0xC0), ..ExpectedState::empty() },
    );
}

#[test]
fn sbc_immediate() {
    run_test(
        // LD A, 0x3B; SCF; SBC 0x4F
        "3E3B37DE4F",
        &ExpectedState { a: Some(0xEB), f: Some(0x70), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x3B; OR A (clears carry); SBC 0x3B (no carry in: result is zero)
        "3E3BB7DE3B",
        &ExpectedState { a: Some(0x00), f: Some(0xC0), ..ExpectedState::empty() },
    );
}

#[test]
fn sbc_indirect_hl() {
    run_test(
        // LD HL, 0xC755; LD (HL), 0x01; LD A, 0x00; SCF; SBC (HL)
        "2155C736013E00379E",
        &ExpectedState { a: Some(0xFE), f: Some(0x70), ..ExpectedState::empty() },
    );
}

#[test]
fn compare() {
    run_test(
        // LD A, 0x3C; CP 0x2F
        "3E3CFE2F",
        &ExpectedState { a: Some(0x3C), f: Some(0x60), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x3C; CP 0x3C
        "3E3CFE3C",
        &ExpectedState { a: Some(0x3C), f: Some(0xC0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x3C; CP 0x40
        "3E3CFE40",
        &ExpectedState { a: Some(0x3C), f: Some(0x50), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x3C; LD B, 0x2F; CP B
        "3E3C062FB8",
        &ExpectedState { a: Some(0x3C), b: Some(0x2F), f: Some(0x60), ..ExpectedState::empty() },
    );
}

#[test]
fn and_or_xor_immediate() {
    run_test(
        // LD A, 0x3E; AND 0x0F
        "3E3EE60F",
        &ExpectedState { a: Some(0x0E), f: Some(0x20), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xF0; AND 0x0F
        "3EF0E60F",
        &ExpectedState { a: Some(0x00), f: Some(0xA0), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x5A; OR 0x0F
        "3E5AF60F",
        &ExpectedState { a: Some(0x5F), f: Some(0x00), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0x00; OR 0x00
        "3E00F600",
        &ExpectedState { a: Some(0x00), f: Some(0x80), ..ExpectedState::empty() },
    );

    run_test(
        // LD A, 0xFF; XOR 0x0F
        "3EFFEE0F",
        &ExpectedState { a: Some(0xF0), f: Some(0x00), ..ExpectedState::empty() },
    );

    // XOR A always zeroes the accumulator
    run_test(
        "3E91AF",
        &ExpectedState { a: Some(0x00), f: Some(0x80), ..ExpectedState::empty() },
    );
}

#[test]
fn xor_indirect_hl() {
    run_test(
        // LD HL, 0xCC07; LD (HL), 0x8A; LD A, 0xA8; XOR (HL)
        "2107CC368A3EA8AE",
        &ExpectedState { a: Some(0x22), f: Some(0x00), ..ExpectedState::empty() },
    );
}

#[test]
fn increment_register() {
    // XOR A; LD A, 0x0F; INC A (half carry from the low nibble, carry untouched)
    run_test(
        "AF3E0F3C",
        &ExpectedState { a: Some(0x10), f: Some(0x20), ..ExpectedState::empty() },
    );

    // XOR A; LD B, 0xFF; INC B (wraps to zero)
    run_test(
        "AF06FF04",
        &ExpectedState { b: Some(0x00), f: Some(0xA0), ..ExpectedState::empty() },
    );

    // SCF; LD C, 0x42; INC C (carry flag is untouched)
    run_test(
        "370E420C",
        &ExpectedState { c: Some(0x43), f: Some(0x10), ..ExpectedState::empty() },
    );
}

#[test]
fn decrement_register() {
    // XOR A; LD A, 0x10; DEC A (borrow from bit 4)
    run_test(
        "AF3E103D",
        &ExpectedState { a: Some(0x0F), f: Some(0x60), ..ExpectedState::empty() },
    );

    // XOR A; LD D, 0x01; DEC D
    run_test(
        "AF160115",
        &ExpectedState { d: Some(0x00), f: Some(0xC0), ..ExpectedState::empty() },
    );

    // XOR A; LD E, 0x00; DEC E (wraps to 0xFF)
    run_test(
        "AF1E001D",
        &ExpectedState { e: Some(0xFF), f: Some(0x60), ..ExpectedState::empty() },
    );
}

#[test]
fn increment_decrement_indirect_hl() {
    run_test(
        // XOR A; LD HL, 0xD420; LD (HL), 0x0F; INC (HL)
        "AF2120D4360F34",
        &ExpectedState {
            f: Some(0x20),
            memory: hash_map!(0xD420: 0x10),
            ..ExpectedState::empty()
        },
    );

    run_test(
        // XOR A; LD HL, 0xD420; LD (HL), 0x01; DEC (HL)
        "AF2120D4360135",
        &ExpectedState {
            f: Some(0xC0),
            memory: hash_map!(0xD420: 0x00),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn increment_decrement_register_pair() {
    // LD BC, 0xFFFF; INC BC (wraps, flags untouched after XOR A)
    run_test(
        "AF01FFFF03",
        &ExpectedState { b: Some(0x00), c: Some(0x00), f: Some(0x80), ..ExpectedState::empty() },
    );

    // LD DE, 0x0000; DEC DE
    run_test(
        "AF1100001B",
        &ExpectedState { d: Some(0xFF), e: Some(0xFF), f: Some(0x80), ..ExpectedState::empty() },
    );
}

#[test]
fn add_hl_register_pair() {
    // XOR A; LD HL, 0x0FFF; LD BC, 0x0001; ADD HL, BC (half carry at bit 12, Z untouched)
    run_test(
        "AF21FF0F01010009",
        &ExpectedState { h: Some(0x10), l: Some(0x00), f: Some(0xA0), ..ExpectedState::empty() },
    );

    // XOR A; LD HL, 0x8A23; ADD HL, HL (carry out of bit 16)
    run_test(
        "AF21238A29",
        &ExpectedState { h: Some(0x14), l: Some(0x46), f: Some(0xB0), ..ExpectedState::empty() },
    );

    // XOR A; LD HL, 0x1234; LD SP, 0x0111; ADD HL, SP
    run_test(
        "AF21341231110139",
        &ExpectedState { h: Some(0x13), l: Some(0x45), f: Some(0x80), ..ExpectedState::empty() },
    );
}

#[test]
fn add_sp_immediate() {
    // ADD SP, 0x02 from the initial 0xFFFE (carries out of both bit 3 and bit 7 of the
    // low byte)
    run_test(
        "E802",
        &ExpectedState { sp: Some(0x0000), f: Some(0x30), ..ExpectedState::empty() },
    );

    // LD SP, 0x0005; ADD SP, -0x02
    run_test(
        "310500E8FE",
        &ExpectedState { sp: Some(0x0003), f: Some(0x30), ..ExpectedState::empty() },
    );

    // LD SP, 0xC000; ADD SP, 0x05 (no carries)
    run_test(
        "3100C0E805",
        &ExpectedState { sp: Some(0xC005), f: Some(0x00), ..ExpectedState::empty() },
    );

    // LD SP, 0x0000; ADD SP, -0x10: the operand byte is 0xF0, so its low nibble is zero and
    // the unsigned additions 0x0+0x0 and 0x00+0xF0 produce no carries at all
    run_test(
        "310000E8F0",
        &ExpectedState { sp: Some(0xFFF0), f: Some(0x00), ..ExpectedState::empty() },
    );

    // LD SP, 0x000F; ADD SP, -0x01 (operand byte 0xFF carries out of both bit 3 and bit 7)
    run_test(
        "310F00E8FF",
        &ExpectedState { sp: Some(0x000E), f: Some(0x30), ..ExpectedState::empty() },
    );
}

#[test]
fn load_hl_stack_pointer_offset() {
    // LD SP, 0xC000; LD HL, SP+0x05
    run_test(
        "3100C0F805",
        &ExpectedState {
            h: Some(0xC0),
            l: Some(0x05),
            sp: Some(0xC000),
            f: Some(0x00),
            ..ExpectedState::empty()
        },
    );

    // LD SP, 0xDF10; LD HL, SP-0x10: operand byte 0xF0 has a zero low nibble, so only the
    // byte addition 0x10+0xF0 carries
    run_test(
        "3110DFF8F0",
        &ExpectedState {
            h: Some(0xDF),
            l: Some(0x00),
            sp: Some(0xDF10),
            f: Some(0x10),
            ..ExpectedState::empty()
        },
    );
}

#[test]
fn decimal_adjust_after_addition() {
    // LD A, 0x45; ADD 0x38; DAA
    run_test(
        "3E45C63827",
        &ExpectedState { a: Some(0x83), f: Some(0x00), ..ExpectedState::empty() },
    );

    // LD A, 0x99; ADD 0x01; DAA (adjusts into a carry and a zero result)
    run_test(
        "3E99C60127",
        &ExpectedState { a: Some(0x00), f: Some(0x90), ..ExpectedState::empty() },
    );
}

#[test]
fn decimal_adjust_after_subtraction() {
    // LD A, 0x42; SUB 0x05; DAA
    run_test(
        "3E42D60527",
        &ExpectedState { a: Some(0x37), f: Some(0x40), ..ExpectedState::empty() },
    );
}

#[test]
fn complement_accumulator() {
    // LD A, 0x35; OR A (clears the flags); CPL (Z and C untouched)
    run_test(
        "3E35B72F",
        &ExpectedState { a: Some(0xCA), f: Some(0x60), ..ExpectedState::empty() },
    );
}

#[test]
fn carry_flag_ops() {
    // XOR A; SCF
    run_test("AF37", &ExpectedState { f: Some(0x90), ..ExpectedState::empty() });

    // XOR A; SCF; CCF (toggles carry back off)
    run_test("AF373F", &ExpectedState { f: Some(0x80), ..ExpectedState::empty() });

    // XOR A; CCF (toggles carry on)
    run_test("AF3F", &ExpectedState { f: Some(0x90), ..ExpectedState::empty() });
}

use ethereum_types::{Address, U256};
use lfvm::util::{Bytecode, CallInstruction, EvmTester};
use lfvm::{CallResult, OpCode};

fn zero_word() -> Vec<u8> {
    vec![0u8; 32]
}

fn word_of(byte: u8) -> Vec<u8> {
    let mut w = zero_word();
    w[31] = byte;
    w
}

fn success(output: impl Into<bytes::Bytes>) -> CallResult {
    CallResult {
        success: true,
        output: output.into(),
        gas_left: 0,
        gas_refund: 0,
        created_address: None,
    }
}

fn success_with_address(address: Address) -> CallResult {
    CallResult {
        success: true,
        output: bytes::Bytes::new(),
        gas_left: 0,
        gas_refund: 0,
        created_address: Some(address),
    }
}

#[test]
fn call_output_is_copied_to_memory() {
    let code = Bytecode::new()
        .append_bc(CallInstruction::call(0x77).gas(100_000).input(0, 0).output(0, 0x20))
        .ret(0, 0x20);

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success(vec![0xAAu8; 32])))
        .code(code)
        .expect_success(true)
        .output(vec![0xAAu8; 32])
        .run();
}

#[test]
fn call_failure_pushes_zero_and_leaves_memory_untouched() {
    let code = Bytecode::new()
        .append_bc(CallInstruction::call(0x77).gas(100_000).input(0, 0).output(0, 0))
        .ret_top();

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(CallResult::failed()))
        .code(code)
        .expect_success(true)
        .output(zero_word())
        .run();
}

#[test]
fn call_to_depth_limit_is_skipped_even_though_the_host_would_succeed() {
    let code = Bytecode::new()
        .append_bc(CallInstruction::call(0x77).gas(100_000).input(0, 0).output(0, 0))
        .ret_top();

    EvmTester::new()
        .depth(1024)
        .apply_host(|host, _| host.set_call_result(success(vec![0x11u8; 4])))
        .code(code)
        .expect_success(true)
        .output(zero_word())
        .run();
}

#[test]
fn call_with_value_under_a_static_frame_fails() {
    let code = Bytecode::from(CallInstruction::call(0x77).gas(100_000).value(1).input(0, 0).output(0, 0));

    EvmTester::new()
        .set_static(true)
        .apply_host(|host, _| host.set_call_result(success(Vec::<u8>::new())))
        .code(code)
        .expect_success(false)
        .run();
}

#[test]
fn call_with_value_skips_when_recipient_balance_is_too_low() {
    let code = Bytecode::new()
        .append_bc(CallInstruction::call(0x77).gas(100_000).value(1_000).input(0, 0).output(0, 0))
        .ret_top();

    EvmTester::new()
        .apply_host(|host, params| {
            host.account_mut(params.recipient).balance = U256::from(1);
            host.set_call_result(success(vec![0x11u8; 4]));
        })
        .code(code)
        .expect_success(true)
        .output(zero_word())
        .run();
}

#[test]
fn delegatecall_reaches_the_host_and_reports_success() {
    let code = Bytecode::new()
        .append_bc(CallInstruction::delegatecall(0x77).gas(100_000).input(0, 0).output(0, 0x20))
        .ret(0, 0x20);

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success(vec![0x42u8; 32])))
        .code(code)
        .expect_success(true)
        .output(vec![0x42u8; 32])
        .run();
}

#[test]
fn staticcall_reaches_the_host_and_reports_success() {
    let code = Bytecode::from(CallInstruction::staticcall(0x77).gas(100_000).input(0, 0).output(0, 0));

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success(Vec::<u8>::new())))
        .code(code)
        .expect_success(true)
        .run();
}

#[test]
fn callcode_reaches_the_host_and_reports_success() {
    let code = Bytecode::from(CallInstruction::callcode(0x77).gas(100_000).input(0, 0).output(0, 0));

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success(Vec::<u8>::new())))
        .code(code)
        .expect_success(true)
        .run();
}

#[test]
fn create_reports_the_address_the_host_assigns() {
    let created = Address::from_low_u64_be(0xC0FFEE);
    let code = Bytecode::new()
        .pushv(0) // size
        .pushv(0) // offset
        .pushv(0) // endowment
        .opcode(OpCode::CREATE)
        .ret_top();

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success_with_address(created)))
        .code(code)
        .expect_success(true)
        .output({
            let mut w = zero_word();
            w[12..].copy_from_slice(created.as_bytes());
            w
        })
        .run();
}

#[test]
fn create2_reports_the_address_the_host_assigns() {
    let created = Address::from_low_u64_be(0xDEAD);
    let code = Bytecode::new()
        .pushv(7) // salt
        .pushv(0) // size
        .pushv(0) // offset
        .pushv(0) // endowment
        .opcode(OpCode::CREATE2)
        .ret_top();

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success_with_address(created)))
        .code(code)
        .expect_success(true)
        .output({
            let mut w = zero_word();
            w[12..].copy_from_slice(created.as_bytes());
            w
        })
        .run();
}

#[test]
fn create_skips_when_endowment_exceeds_balance() {
    let code = Bytecode::new()
        .pushv(0)
        .pushv(0)
        .pushv(1_000)
        .opcode(OpCode::CREATE)
        .ret_top();

    EvmTester::new()
        .apply_host(|host, params| {
            host.account_mut(params.recipient).balance = U256::from(1);
            host.set_call_result(success_with_address(Address::from_low_u64_be(1)));
        })
        .code(code)
        .expect_success(true)
        .output(zero_word())
        .run();
}

#[test]
fn returndatasize_before_any_call_is_zero() {
    let code = Bytecode::new().opcode(OpCode::RETURNDATASIZE).ret_top();

    EvmTester::new().code(code).expect_success(true).output(zero_word()).run();
}

#[test]
fn returndatasize_reports_the_last_calls_output_length() {
    let code = Bytecode::new()
        .append_bc(CallInstruction::call(0x77).gas(100_000).input(0, 0).output(0, 0))
        .opcode(OpCode::POP)
        .opcode(OpCode::RETURNDATASIZE)
        .ret_top();

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success(vec![0x01u8; 5])))
        .code(code)
        .expect_success(true)
        .output(word_of(5))
        .run();
}

#[test]
fn returndatacopy_copies_the_requested_slice() {
    // CALL, drop its status flag, then RETURNDATACOPY(destOffset=0, offset=1, size=2) and return it.
    let code = Bytecode::new()
        .append_bc(CallInstruction::call(0x77).gas(100_000).input(0, 0).output(0, 0))
        .opcode(OpCode::POP)
        .pushv(2) // size
        .pushv(1) // offset into return data
        .pushv(0) // dest memory offset
        .opcode(OpCode::RETURNDATACOPY)
        .ret(0, 2);

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success(vec![0xAA, 0xBB, 0xCC, 0xDD])))
        .code(code)
        .expect_success(true)
        .output(vec![0xBB, 0xCC])
        .run();
}

#[test]
fn returndatacopy_out_of_range_fails() {
    let code = Bytecode::new()
        .append_bc(CallInstruction::call(0x77).gas(100_000).input(0, 0).output(0, 0))
        .opcode(OpCode::POP)
        .pushv(10) // size, larger than the available return data
        .pushv(0) // offset
        .pushv(0) // dest
        .opcode(OpCode::RETURNDATACOPY);

    EvmTester::new()
        .apply_host(|host, _| host.set_call_result(success(vec![0x01, 0x02])))
        .code(code)
        .expect_success(false)
        .run();
}

use lfvm::util::{Bytecode, EvmTester};
use lfvm::{OpCode, Revision};

#[test]
fn basefee_pre_london_fails() {
    let result = EvmTester::new()
        .revision(Revision::Berlin)
        .code(Bytecode::new().opcode(OpCode::BASEFEE))
        .expect_success(false)
        .run();
    assert!(!result.success);
}

#[test]
fn basefee_nominal_case() {
    // https://eips.ethereum.org/EIPS/eip-3198#nominal-case
    EvmTester::new()
        .revision(Revision::London)
        .apply_host(|host, _| {
            host.tx_context.block_base_fee = 7.into();
        })
        .code(Bytecode::new().opcode(OpCode::BASEFEE).opcode(OpCode::STOP))
        .expect_success(true)
        .gas_used(2)
        .run();
}

#[test]
fn basefee_pushes_the_tx_context_value() {
    EvmTester::new()
        .revision(Revision::London)
        .apply_host(|host, _| {
            host.tx_context.block_base_fee = 7.into();
        })
        .code(Bytecode::new().opcode(OpCode::BASEFEE).ret_top())
        .expect_success(true)
        .output([0u8; 31].iter().copied().chain([7]).collect::<Vec<u8>>())
        .run();
}
